//! # Section loaders
//!
//! One function per [`PackageSection`]. Each reads its section from a
//! package root and fails with [`PackError::SectionNotFound`] when the
//! section is missing. Directory listings are sorted so the same tree
//! always loads into the same value.
//!
//! Suite sections (`test_data`, `validation/sparql`, `validation/shacl`)
//! hold one subdirectory per suite; each suite holds its files directly.
//! Technical mappings keep only files with an RML or YARRRML suffix.
//!
//! Entries are classified without following symbolic links, and a link
//! anywhere inside the package is an error, so every asset is read from
//! inside the root.

use std::fs;
use std::path::{Path, PathBuf};

use mssdk_core::{
    Asset, AssetCollection, AssetContent, MappingDialect, PackageMetadata, PackageSection,
    RelativePath,
};

use crate::error::{PackError, PackResult};

pub fn load_metadata(root: &Path) -> PackResult<PackageMetadata> {
    let path = require(root, PackageSection::Metadata)?;
    let bytes = fs::read(&path).map_err(|e| PackError::io(&path, e))?;
    let document: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| PackError::JsonParse {
            path: path.clone(),
            source,
        })?;
    PackageMetadata::from_wire(document).map_err(|source| PackError::Metadata { path, source })
}

/// The conceptual mapping spreadsheet, always kept as raw bytes.
pub fn load_conceptual_mapping(root: &Path) -> PackResult<Asset> {
    let path = require(root, PackageSection::ConceptualMapping)?;
    let bytes = fs::read(&path).map_err(|e| PackError::io(&path, e))?;
    Ok(Asset::binary(PackageSection::ConceptualMapping.path(), bytes))
}

pub fn load_technical_mappings(root: &Path) -> PackResult<AssetCollection> {
    let dir = require(root, PackageSection::TechnicalMappings)?;
    let mut files = Vec::new();
    for path in list_files(&dir)? {
        let relative = relative_to(root, &path)?;
        let Some(dialect) = relative.suffix().and_then(MappingDialect::from_suffix) else {
            tracing::debug!(file = %relative, "skipping file without a mapping suffix");
            continue;
        };
        files.push(read_asset(&path, relative)?.with_dialect(dialect));
    }
    Ok(AssetCollection::new(PackageSection::TechnicalMappings.path(), files))
}

pub fn load_vocabulary_mappings(root: &Path) -> PackResult<AssetCollection> {
    let dir = require(root, PackageSection::VocabularyMappings)?;
    let files = load_files(root, &dir)?;
    Ok(AssetCollection::new(PackageSection::VocabularyMappings.path(), files))
}

pub fn load_test_data_suites(root: &Path) -> PackResult<Vec<AssetCollection>> {
    load_suites(root, PackageSection::TestData)
}

pub fn load_sparql_suites(root: &Path) -> PackResult<Vec<AssetCollection>> {
    load_suites(root, PackageSection::SparqlSuites)
}

pub fn load_shacl_suites(root: &Path) -> PackResult<Vec<AssetCollection>> {
    load_suites(root, PackageSection::ShaclSuites)
}

/// Test results are produced after authoring, so their absence is not an
/// error. Unlike the other sections the output tree is read recursively.
pub fn load_test_results(root: &Path) -> PackResult<Option<AssetCollection>> {
    let section = PackageSection::TestResults;
    let dir = section.path().resolve(root);
    match fs::symlink_metadata(&dir) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(PackError::SymbolicLink { path: dir })
        }
        Ok(meta) if meta.is_dir() => {}
        _ => return Ok(None),
    }
    let mut files = Vec::new();
    collect_recursive(root, &dir, &mut files)?;
    Ok(Some(AssetCollection::new(section.path(), files)))
}

fn load_suites(root: &Path, section: PackageSection) -> PackResult<Vec<AssetCollection>> {
    let dir = require(root, section)?;
    let mut suites = Vec::new();
    for suite_dir in list_dirs(&dir)? {
        let files = load_files(root, &suite_dir)?;
        suites.push(AssetCollection::new(relative_to(root, &suite_dir)?, files));
    }
    Ok(suites)
}

fn load_files(root: &Path, dir: &Path) -> PackResult<Vec<Asset>> {
    list_files(dir)?
        .into_iter()
        .map(|path| {
            let relative = relative_to(root, &path)?;
            read_asset(&path, relative)
        })
        .collect()
}

fn collect_recursive(root: &Path, dir: &Path, out: &mut Vec<Asset>) -> PackResult<()> {
    for (path, kind) in list_entries(dir)? {
        if kind.is_dir() {
            collect_recursive(root, &path, out)?;
        } else if kind.is_file() {
            let relative = relative_to(root, &path)?;
            out.push(read_asset(&path, relative)?);
        }
    }
    Ok(())
}

fn read_asset(path: &Path, relative: RelativePath) -> PackResult<Asset> {
    let bytes = fs::read(path).map_err(|e| PackError::io(path, e))?;
    Ok(Asset {
        path: relative,
        content: AssetContent::from_bytes(bytes),
        dialect: None,
    })
}

/// Native path of `section`, which must exist with the right kind and be
/// reached without crossing a symbolic link.
fn require(root: &Path, section: PackageSection) -> PackResult<PathBuf> {
    let path = section.path().resolve(root);
    let missing = || PackError::SectionNotFound {
        section,
        path: path.clone(),
    };
    let mut current = root.to_path_buf();
    let mut meta = None;
    for segment in section.path().as_str().split('/') {
        current.push(segment);
        let m = fs::symlink_metadata(&current).map_err(|_| missing())?;
        if m.file_type().is_symlink() {
            return Err(PackError::SymbolicLink { path: current });
        }
        meta = Some(m);
    }
    let present = match meta {
        Some(m) if section.is_file() => m.is_file(),
        Some(m) => m.is_dir(),
        None => false,
    };
    if !present {
        return Err(missing());
    }
    Ok(path)
}

fn relative_to(root: &Path, path: &Path) -> PackResult<RelativePath> {
    let stripped = path.strip_prefix(root).map_err(|_| {
        PackError::InvalidArgument(format!("{} is outside {}", path.display(), root.display()))
    })?;
    RelativePath::from_path(stripped).map_err(|source| PackError::InvalidPath {
        root: root.to_path_buf(),
        source,
    })
}

/// Sorted children of `dir` with their own (not followed) file type.
fn list_entries(dir: &Path) -> PackResult<Vec<(PathBuf, fs::FileType)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PackError::io(dir, e))? {
        let entry = entry.map_err(|e| PackError::io(dir, e))?;
        let path = entry.path();
        let kind = entry.file_type().map_err(|e| PackError::io(&path, e))?;
        if kind.is_symlink() {
            return Err(PackError::SymbolicLink { path });
        }
        entries.push((path, kind));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn list_files(dir: &Path) -> PackResult<Vec<PathBuf>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter_map(|(path, kind)| kind.is_file().then_some(path))
        .collect())
}

fn list_dirs(dir: &Path) -> PackResult<Vec<PathBuf>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter_map(|(path, kind)| kind.is_dir().then_some(path))
        .collect())
}
