//! # Package Serialization
//!
//! Writes a [`MappingPackage`] back to the on-disk layout. Loading the
//! written tree yields a package equal to the one written.

use std::fs;
use std::path::{Path, PathBuf};

use mssdk_core::{Asset, AssetCollection, MappingPackage, PackageSection};

use crate::error::{PackError, PackResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageSerializer;

impl PackageSerializer {
    /// Write every section of `package` under `destination`, creating
    /// directories as needed. Existing files are overwritten, so writing the
    /// same package twice leaves the same tree.
    pub fn write(package: &MappingPackage, destination: &Path) -> PackResult<PathBuf> {
        fs::create_dir_all(destination).map_err(|e| PackError::io(destination, e))?;
        for section in PackageSection::ALL {
            if !section.is_file() && section != PackageSection::TestResults {
                let dir = section.path().resolve(destination);
                fs::create_dir_all(&dir).map_err(|e| PackError::io(&dir, e))?;
            }
        }

        write_asset(destination, &package.conceptual_mapping)?;
        write_collection(destination, &package.technical_mapping_suite)?;
        write_collection(destination, &package.vocabulary_mapping_suite)?;
        for suite in package
            .test_data_suites
            .iter()
            .chain(&package.sparql_test_suites)
            .chain(&package.shacl_test_suites)
            .chain(package.test_results.iter())
        {
            write_collection(destination, suite)?;
        }
        Self::write_metadata(package, destination)?;

        tracing::debug!(
            package = package.identifier(),
            destination = %destination.display(),
            "package written"
        );
        Ok(destination.to_path_buf())
    }

    /// Rewrite only `metadata.json`, pretty-printed in wire form.
    pub fn write_metadata(package: &MappingPackage, destination: &Path) -> PackResult<PathBuf> {
        let path = PackageSection::Metadata.path().resolve(destination);
        let mut body = serde_json::to_vec_pretty(&package.metadata.to_wire()).map_err(|source| {
            PackError::JsonParse {
                path: path.clone(),
                source,
            }
        })?;
        body.push(b'\n');
        fs::write(&path, body).map_err(|e| PackError::io(&path, e))?;
        Ok(path)
    }
}

fn write_collection(root: &Path, collection: &AssetCollection) -> PackResult<()> {
    let dir = collection.path.resolve(root);
    fs::create_dir_all(&dir).map_err(|e| PackError::io(&dir, e))?;
    for asset in &collection.files {
        write_asset(root, asset)?;
    }
    Ok(())
}

fn write_asset(root: &Path, asset: &Asset) -> PackResult<()> {
    let path = asset.path.resolve(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
    }
    fs::write(&path, asset.content.as_bytes()).map_err(|e| PackError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::PackageAssembler;
    use mssdk_core::{AssetContent, MappingDialect, PackageMetadata, RelativePath};

    fn rp(s: &str) -> RelativePath {
        RelativePath::new(s).unwrap()
    }

    fn package() -> MappingPackage {
        let mut metadata = PackageMetadata::new("package_cn");
        metadata.mapping_version = Some("1.0.0".into());
        metadata
            .extra
            .insert("custom_flag".into(), serde_json::json!(true));
        MappingPackage {
            metadata,
            conceptual_mapping: Asset::binary(
                rp("transformation/conceptual_mappings.xlsx"),
                vec![0x50, 0x4b, 0x03, 0x04, 0xff],
            ),
            technical_mapping_suite: AssetCollection::new(
                rp("transformation/mappings"),
                vec![Asset::text(rp("transformation/mappings/a.ttl"), "@prefix ex: <e> .")
                    .with_dialect(MappingDialect::Rml)],
            ),
            vocabulary_mapping_suite: AssetCollection::new(
                rp("transformation/resources"),
                vec![Asset::text(rp("transformation/resources/c.csv"), "k,v\n")],
            ),
            test_data_suites: vec![AssetCollection::new(
                rp("test_data/t1"),
                vec![Asset::text(rp("test_data/t1/d.xml"), "<notice/>")],
            )],
            sparql_test_suites: vec![AssetCollection::new(
                rp("validation/sparql/s1"),
                vec![Asset::text(rp("validation/sparql/s1/e.rq"), "ASK {}")],
            )],
            shacl_test_suites: vec![AssetCollection::new(
                rp("validation/shacl/h1"),
                vec![Asset::text(rp("validation/shacl/h1/f.ttl"), "[] a <S> .")],
            )],
            test_results: Some(AssetCollection::new(
                rp("output"),
                vec![Asset::text(rp("output/t1/report.html"), "<html/>")],
            )),
        }
    }

    #[test]
    fn write_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = package();
        PackageSerializer::write(&pkg, tmp.path()).unwrap();
        let loaded = PackageAssembler::new().build(tmp.path()).unwrap();
        assert_eq!(loaded, pkg);
    }

    #[test]
    fn write_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = package();
        PackageSerializer::write(&pkg, tmp.path()).unwrap();
        let first = fs::read(tmp.path().join("metadata.json")).unwrap();
        PackageSerializer::write(&pkg, tmp.path()).unwrap();
        assert_eq!(first, fs::read(tmp.path().join("metadata.json")).unwrap());
        assert_eq!(PackageAssembler::new().build(tmp.path()).unwrap(), pkg);
    }

    #[test]
    fn metadata_uses_wire_names() {
        let tmp = tempfile::tempdir().unwrap();
        let mut pkg = package();
        pkg.metadata.issue_date = Some("2024-01-01".into());
        PackageSerializer::write(&pkg, tmp.path()).unwrap();
        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(tmp.path().join("metadata.json")).unwrap()).unwrap();
        assert_eq!(doc["created_at"], "2024-01-01");
        assert_eq!(doc["custom_flag"], true);
        assert!(doc.get("issue_date").is_none());
    }

    #[test]
    fn binary_content_written_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = package();
        PackageSerializer::write(&pkg, tmp.path()).unwrap();
        let bytes = fs::read(tmp.path().join("transformation/conceptual_mappings.xlsx")).unwrap();
        assert_eq!(AssetContent::Binary(bytes), pkg.conceptual_mapping.content);
    }
}
