//! # Hash Subcommand
//!
//! Prints the signature a package folder should carry. With `--write` the
//! signature is stored in its `metadata.json`; with `--version` the
//! mapping version is replaced first, so a version bump and its new
//! signature land together.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mssdk_core::PackageSignature;
use mssdk_pack::{PackageAssembler, PackageHasher, PackageSerializer};

use crate::EXIT_OK;

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Package folder to hash.
    #[arg(value_name = "PACKAGE_DIR")]
    pub package: PathBuf,

    /// Mapping version to hash with instead of the one in metadata.json.
    #[arg(long)]
    pub version: Option<String>,

    /// Store the signature (and version, if given) in metadata.json.
    #[arg(long)]
    pub write: bool,
}

pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let stdout = std::io::stdout();
    run_hash_to(args, &mut stdout.lock())
}

pub fn run_hash_to(args: &HashArgs, out: &mut impl Write) -> Result<u8> {
    let package = PackageAssembler::new()
        .build(&args.package)
        .with_context(|| format!("failed to load package {}", args.package.display()))?;
    let digest = PackageHasher::hash(&package, args.version.as_deref())
        .with_context(|| format!("failed to hash package {}", package.identifier()))?;
    writeln!(out, "{}", digest.to_hex())?;

    if args.write {
        let mut package = package;
        if let Some(version) = &args.version {
            package.metadata.mapping_version = Some(version.clone());
        }
        let signed = package.with_signature(PackageSignature::from(&digest));
        let path = PackageSerializer::write_metadata(&signed, &args.package)
            .context("failed to write metadata")?;
        tracing::info!(path = %path.display(), "signature written");
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mssdk_pack::ValidationPipeline;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn make_package(root: &Path) {
        write(
            root,
            "metadata.json",
            r#"{"identifier": "package_hash", "mapping_version": "1.0.0"}"#,
        );
        write(root, "transformation/conceptual_mappings.xlsx", "xlsx");
        write(root, "transformation/mappings/a.ttl", "@prefix ex: <e> .");
        write(root, "transformation/resources/c.csv", "k,v");
        write(root, "test_data/t1/d.xml", "<notice/>");
        write(root, "validation/sparql/s1/e.rq", "ASK {}");
        write(root, "validation/shacl/h1/f.ttl", "[] a <S> .");
    }

    fn run(args: &HashArgs) -> String {
        let mut buf = Vec::new();
        assert_eq!(run_hash_to(args, &mut buf).unwrap(), EXIT_OK);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn prints_hex_without_touching_metadata() {
        let dir = tempfile::tempdir().unwrap();
        make_package(dir.path());
        let before = fs::read(dir.path().join("metadata.json")).unwrap();
        let printed = run(&HashArgs {
            package: dir.path().to_path_buf(),
            version: None,
            write: false,
        });
        assert_eq!(printed.trim().len(), 64);
        assert_eq!(before, fs::read(dir.path().join("metadata.json")).unwrap());
    }

    #[test]
    fn write_makes_package_valid() {
        let dir = tempfile::tempdir().unwrap();
        make_package(dir.path());
        run(&HashArgs {
            package: dir.path().to_path_buf(),
            version: Some("1.1.0".into()),
            write: true,
        });
        let package = PackageAssembler::new().build(dir.path()).unwrap();
        assert_eq!(package.metadata.mapping_version.as_deref(), Some("1.1.0"));
        assert!(ValidationPipeline::standard().validate(&package).unwrap());
    }

    #[test]
    fn missing_package_is_error() {
        let mut buf = Vec::new();
        let args = HashArgs {
            package: PathBuf::from("/nonexistent/package"),
            version: None,
            write: false,
        };
        assert!(run_hash_to(&args, &mut buf).is_err());
    }
}
