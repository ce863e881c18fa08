//! # Validate Subcommand
//!
//! Validates packages from an archive, a folder of package folders, or a
//! git repository. Prints one line per package and, for the bulk sources,
//! a summary line.
//!
//! Returns exit code: 0 when every package is valid, 1 when any package
//! fails validation. Operational errors propagate and become exit code 2.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use mssdk_extract::GitSource;
use mssdk_pack::{
    validate_bulk_from_folder, validate_bulk_from_git, BulkOutcome, BulkValidationReport,
    PackError, PackageService, ValidationPipeline,
};

use crate::config::SdkConfig;
use crate::{EXIT_INVALID, EXIT_OK};

/// Arguments for the `mssdk validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(subcommand)]
    pub source: ValidateSource,
}

#[derive(Subcommand, Debug)]
pub enum ValidateSource {
    /// Validate a single package archive (.zip, .tar, .tar.gz).
    FromArchive {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },

    /// Validate every package folder inside a directory.
    FromFolder {
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Rewrite stale signatures in metadata.json.
        #[arg(short = 'u', long)]
        update_hash: bool,
    },

    /// Validate every package in a git repository matching a glob pattern.
    #[command(alias = "from-github")]
    FromGit {
        #[arg(value_name = "URL")]
        url: String,

        /// Glob pattern for package directories, relative to the repository root.
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Branch or tag to check out.
        #[arg(short = 'b', long)]
        branch: Option<String>,
    },
}

pub fn run_validate(args: &ValidateArgs, config: &SdkConfig) -> Result<u8> {
    let pipeline = ValidationPipeline::standard();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &args.source {
        ValidateSource::FromArchive { archive } => {
            let service = PackageService::new();
            match service.validate_from_archive(archive, &pipeline) {
                Ok(_) => {
                    writeln!(out, "OK: {}", archive.display())?;
                    Ok(EXIT_OK)
                }
                Err(PackError::Validation(e)) => {
                    writeln!(out, "FAIL: {}: {e}", archive.display())?;
                    Ok(EXIT_INVALID)
                }
                Err(e) => Err(e)
                    .with_context(|| format!("failed to load package from {}", archive.display())),
            }
        }
        ValidateSource::FromFolder {
            folder,
            update_hash,
        } => {
            let report =
                validate_bulk_from_folder(folder, &pipeline, &config.bulk_options(*update_hash))
                    .with_context(|| format!("failed to validate packages in {}", folder.display()))?;
            print_report(&report, &mut out)
        }
        ValidateSource::FromGit {
            url,
            pattern,
            branch,
        } => {
            let mut source = GitSource::new(url.clone(), pattern.clone());
            if let Some(branch) = branch {
                source = source.at(branch.clone());
            }
            let report = validate_bulk_from_git(
                &config.git_extractor(),
                &source,
                &pipeline,
                &config.bulk_options(false),
            )
            .with_context(|| format!("failed to validate packages from {url}"))?;
            print_report(&report, &mut out)
        }
    }
}

/// Print one line per entry and a summary. Returns the exit code.
pub fn print_report(report: &BulkValidationReport, out: &mut impl Write) -> Result<u8> {
    if report.is_empty() {
        writeln!(out, "no mapping packages found")?;
        return Ok(EXIT_INVALID);
    }
    for entry in &report.entries {
        let label = match &entry.package {
            Some(id) => format!("{} ({id})", entry.source),
            None => entry.source.clone(),
        };
        match &entry.outcome {
            BulkOutcome::Valid => writeln!(out, "OK: {label}")?,
            BulkOutcome::HashUpdated { signature, .. } => {
                writeln!(out, "UPDATED: {label} signature {signature}")?
            }
            BulkOutcome::Invalid(reason) | BulkOutcome::Failed(reason) => {
                writeln!(out, "FAIL: {label}: {reason}")?
            }
        }
    }
    writeln!(
        out,
        "{}/{} packages valid",
        report.valid_count(),
        report.len()
    )?;
    Ok(if report.all_valid() {
        EXIT_OK
    } else {
        EXIT_INVALID
    })
}
