//! # Pack and Unpack Subcommands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mssdk_extract::ArchiveExtractor;

use crate::EXIT_OK;

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Package folder to pack.
    #[arg(value_name = "PACKAGE_DIR")]
    pub directory: PathBuf,

    /// Archive to create; the format follows the extension.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Directory to unpack into; created if missing.
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,
}

pub fn run_pack(args: &PackArgs) -> Result<u8> {
    let written = ArchiveExtractor::new()
        .pack(&args.directory, &args.archive)
        .with_context(|| format!("failed to pack {}", args.directory.display()))?;
    println!("{}", written.display());
    Ok(EXIT_OK)
}

pub fn run_unpack(args: &UnpackArgs) -> Result<u8> {
    let root = ArchiveExtractor::new()
        .extract(&args.archive, &args.destination)
        .with_context(|| format!("failed to unpack {}", args.archive.display()))?;
    println!("{}", root.display());
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn pack_then_unpack() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("test_data/t1")).unwrap();
        fs::write(src.join("test_data/t1/d.xml"), "<notice/>").unwrap();
        let archive = dir.path().join("pkg.tgz");

        run_pack(&PackArgs {
            directory: src.clone(),
            archive: archive.clone(),
        })
        .unwrap();
        let dest = dir.path().join("dest");
        run_unpack(&UnpackArgs {
            archive,
            destination: dest.clone(),
        })
        .unwrap();
        assert_eq!(fs::read_to_string(dest.join("test_data/t1/d.xml")).unwrap(), "<notice/>");
    }

    #[test]
    fn unsupported_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_pack(&PackArgs {
            directory: dir.path().to_path_buf(),
            archive: dir.path().join("pkg.7z"),
        });
        assert!(result.is_err());
    }
}
