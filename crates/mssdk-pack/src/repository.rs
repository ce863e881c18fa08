//! # Package Repository
//!
//! Whole packages persisted as JSON documents keyed by the metadata
//! identifier. Two stores share the [`PackageRepository`] contract: an
//! in-memory map for tests and embedding, and a directory of
//! `<identifier>.json` files.
//!
//! `read_many` filters on metadata wire fields: a document matches when
//! every `(key, value)` in the filter equals the metadata value under
//! that key.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mssdk_core::MappingPackage;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("mapping package {id} not found")]
    ModelNotFound { id: String },

    #[error("mapping package {id} already exists")]
    DuplicateKey { id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("repository document error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Metadata filter for [`PackageRepository::read_many`], keyed by wire name.
pub type MetadataFilter = Map<String, Value>;

pub trait PackageRepository: Send + Sync {
    /// Store a new package. Fails with `DuplicateKey` if the identifier is taken.
    fn create(&self, package: &MappingPackage) -> RepositoryResult<String>;

    fn read(&self, id: &str) -> RepositoryResult<MappingPackage>;

    /// Packages whose metadata matches `filter`, ordered by identifier.
    fn read_many(&self, filter: &MetadataFilter) -> RepositoryResult<Vec<MappingPackage>>;

    /// Replace a stored package. Fails with `ModelNotFound` if absent.
    fn update(&self, package: &MappingPackage) -> RepositoryResult<()>;

    fn delete(&self, id: &str) -> RepositoryResult<()>;
}

fn check_id(id: &str) -> RepositoryResult<()> {
    if id.is_empty() {
        return Err(RepositoryError::InvalidArgument(
            "package identifier must not be empty".into(),
        ));
    }
    Ok(())
}

fn matches_filter(package: &MappingPackage, filter: &MetadataFilter) -> bool {
    if filter.is_empty() {
        return true;
    }
    let wire = package.metadata.to_wire();
    filter.iter().all(|(key, expected)| wire.get(key) == Some(expected))
}

// -- In-memory store ----------------------------------------------------------

/// Thread-safe, cloneable in-memory repository.
///
/// Documents are stored serialized so a read never aliases a caller's value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPackageRepository {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl InMemoryPackageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PackageRepository for InMemoryPackageRepository {
    fn create(&self, package: &MappingPackage) -> RepositoryResult<String> {
        let id = package.identifier();
        check_id(id)?;
        let document = serde_json::to_value(package)?;
        let mut guard = self.documents.write();
        if guard.contains_key(id) {
            return Err(RepositoryError::DuplicateKey { id: id.to_string() });
        }
        guard.insert(id.to_string(), document);
        Ok(id.to_string())
    }

    fn read(&self, id: &str) -> RepositoryResult<MappingPackage> {
        check_id(id)?;
        let document = self
            .documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::ModelNotFound { id: id.to_string() })?;
        Ok(serde_json::from_value(document)?)
    }

    fn read_many(&self, filter: &MetadataFilter) -> RepositoryResult<Vec<MappingPackage>> {
        let documents: Vec<Value> = self.documents.read().values().cloned().collect();
        let mut packages = Vec::new();
        for document in documents {
            let package: MappingPackage = serde_json::from_value(document)?;
            if matches_filter(&package, filter) {
                packages.push(package);
            }
        }
        Ok(packages)
    }

    fn update(&self, package: &MappingPackage) -> RepositoryResult<()> {
        let id = package.identifier();
        check_id(id)?;
        let document = serde_json::to_value(package)?;
        match self.documents.write().get_mut(id) {
            Some(slot) => {
                *slot = document;
                Ok(())
            }
            None => Err(RepositoryError::ModelNotFound { id: id.to_string() }),
        }
    }

    fn delete(&self, id: &str) -> RepositoryResult<()> {
        check_id(id)?;
        self.documents
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::ModelNotFound { id: id.to_string() })
    }
}

// -- Filesystem store ---------------------------------------------------------

/// One pretty-printed JSON document per package under a root directory.
#[derive(Debug, Clone)]
pub struct FsPackageRepository {
    root: PathBuf,
}

impl FsPackageRepository {
    /// Open a repository rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| RepositoryError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> RepositoryResult<PathBuf> {
        check_id(id)?;
        let unsafe_id = id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0'])
            || id.starts_with('.');
        if unsafe_id {
            return Err(RepositoryError::InvalidArgument(format!(
                "package identifier {id:?} cannot name a document"
            )));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn load(path: &Path) -> RepositoryResult<MappingPackage> {
        let bytes = fs::read(path).map_err(|source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write via a sibling temp file and rename so readers never see a
    /// partial document.
    fn store(path: &Path, package: &MappingPackage) -> RepositoryResult<()> {
        let body = serde_json::to_vec_pretty(package)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, body)
            .and_then(|()| fs::rename(&staging, path))
            .map_err(|source| {
                let _ = fs::remove_file(&staging);
                RepositoryError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })
    }
}

impl PackageRepository for FsPackageRepository {
    fn create(&self, package: &MappingPackage) -> RepositoryResult<String> {
        let id = package.identifier();
        let path = self.document_path(id)?;
        let body = serde_json::to_vec_pretty(package)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RepositoryError::DuplicateKey { id: id.to_string() });
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };
        file.write_all(&body)
            .map_err(|source| RepositoryError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(package = id, path = %path.display(), "package document created");
        Ok(id.to_string())
    }

    fn read(&self, id: &str) -> RepositoryResult<MappingPackage> {
        let path = self.document_path(id)?;
        if !path.is_file() {
            return Err(RepositoryError::ModelNotFound { id: id.to_string() });
        }
        Self::load(&path)
    }

    fn read_many(&self, filter: &MetadataFilter) -> RepositoryResult<Vec<MappingPackage>> {
        let entries = fs::read_dir(&self.root).map_err(|source| RepositoryError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| RepositoryError::Io {
                    path: self.root.clone(),
                    source,
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut packages = Vec::new();
        for path in paths {
            let package = Self::load(&path)?;
            if matches_filter(&package, filter) {
                packages.push(package);
            }
        }
        Ok(packages)
    }

    fn update(&self, package: &MappingPackage) -> RepositoryResult<()> {
        let id = package.identifier();
        let path = self.document_path(id)?;
        if !path.is_file() {
            return Err(RepositoryError::ModelNotFound { id: id.to_string() });
        }
        Self::store(&path, package)
    }

    fn delete(&self, id: &str) -> RepositoryResult<()> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::ModelNotFound { id: id.to_string() })
            }
            Err(source) => Err(RepositoryError::Io { path, source }),
        }
    }
}
