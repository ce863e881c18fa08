//! # Bulk Validation
//!
//! Validates many packages on a bounded `rayon` pool. A failing package
//! never stops the others; every package gets one [`BulkEntry`] and the
//! report keeps source order.
//!
//! Folder validation can repair stale signatures (`update_hash`): a package
//! whose only failure is a signature mismatch gets the computed signature
//! written to its `metadata.json` and is reported as
//! [`BulkOutcome::HashUpdated`].

use std::fs;
use std::path::{Path, PathBuf};

use mssdk_core::PackageSignature;
use mssdk_extract::{ArchiveExtractor, GitExtractor, GitSource, PackageRoots, SourceExtractor};
use rayon::prelude::*;

use crate::assembler::PackageAssembler;
use crate::error::{PackError, PackResult};
use crate::serializer::PackageSerializer;
use crate::validation::{PackageValidationError, ValidationPipeline};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Valid,
    /// The stored signature was stale and has been rewritten.
    HashUpdated {
        previous: Option<String>,
        signature: PackageSignature,
    },
    /// The package loaded but failed validation.
    Invalid(String),
    /// The package could not be acquired or loaded.
    Failed(String),
}

impl BulkOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid | Self::HashUpdated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkEntry {
    /// Where the package came from: a folder, archive or repository path.
    pub source: String,
    /// Package identifier, when the package could be loaded.
    pub package: Option<String>,
    pub outcome: BulkOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkValidationReport {
    pub entries: Vec<BulkEntry>,
}

impl BulkValidationReport {
    /// True when every entry is valid. An empty report is not valid.
    pub fn all_valid(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.outcome.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_valid()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    /// Worker threads. `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Rewrite stale signatures during folder validation.
    pub update_hash: bool,
}

fn worker_pool(options: &BulkOptions) -> PackResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mssdk-validate-{i}"));
    if let Some(workers) = options.workers {
        if workers == 0 {
            return Err(PackError::InvalidArgument(
                "worker count must be at least 1".into(),
            ));
        }
        builder = builder.num_threads(workers);
    }
    // Workers report to the caller's subscriber, scoped or global.
    let dispatch = tracing::dispatcher::get_default(|d| d.clone());
    let pool = builder
        .spawn_handler(move |thread| {
            let dispatch = dispatch.clone();
            let mut spawner = std::thread::Builder::new();
            if let Some(name) = thread.name() {
                spawner = spawner.name(name.to_owned());
            }
            if let Some(size) = thread.stack_size() {
                spawner = spawner.stack_size(size);
            }
            spawner.spawn(move || tracing::dispatcher::with_default(&dispatch, || thread.run()))?;
            Ok(())
        })
        .build()?;
    Ok(pool)
}

/// Validate every direct subdirectory of `folder` as a package.
pub fn validate_bulk_from_folder(
    folder: &Path,
    pipeline: &ValidationPipeline,
    options: &BulkOptions,
) -> PackResult<BulkValidationReport> {
    let _span = tracing::info_span!("bulk_validate", folder = %folder.display()).entered();
    if !folder.exists() {
        return Err(PackError::NotFound {
            path: folder.to_path_buf(),
        });
    }
    if !folder.is_dir() {
        return Err(PackError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }

    let mut packages = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| PackError::io(folder, e))? {
        let entry = entry.map_err(|e| PackError::io(folder, e))?;
        let kind = entry.file_type().map_err(|e| PackError::io(entry.path(), e))?;
        if kind.is_dir() {
            packages.push(entry.path());
        }
    }
    packages.sort();
    tracing::info!(packages = packages.len(), "validating package folders");

    let pool = worker_pool(options)?;
    let entries: Vec<BulkEntry> = pool.install(|| {
        packages
            .par_iter()
            .map(|root| {
                validate_root(root, root.display().to_string(), pipeline, options.update_hash)
            })
            .collect()
    });
    Ok(finish(entries))
}

/// Validate each archive as one package.
pub fn validate_bulk_from_archives(
    archives: &[PathBuf],
    pipeline: &ValidationPipeline,
    options: &BulkOptions,
) -> PackResult<BulkValidationReport> {
    let _span = tracing::info_span!("bulk_validate", archives = archives.len()).entered();
    let extractor = ArchiveExtractor::new();
    let pool = worker_pool(options)?;
    let entries: Vec<BulkEntry> = pool.install(|| {
        archives
            .par_iter()
            .map(|archive| {
                let source = archive.display().to_string();
                match SourceExtractor::extract_temporary(&extractor, archive.as_path()) {
                    Ok(scoped) => validate_root(scoped.path(), source, pipeline, false),
                    Err(e) => failed(source, &PackError::from(e)),
                }
            })
            .collect()
    });
    Ok(finish(entries))
}

/// Clone once, then validate every package directory matching the pattern.
///
/// A failed clone or an unmatched pattern is an error for the whole
/// operation, since no package can be reported on.
pub fn validate_bulk_from_git(
    extractor: &GitExtractor,
    source: &GitSource,
    pipeline: &ValidationPipeline,
    options: &BulkOptions,
) -> PackResult<BulkValidationReport> {
    let _span = tracing::info_span!("bulk_validate", url = %source.url, pattern = %source.pattern)
        .entered();
    let scoped = SourceExtractor::extract_temporary(extractor, source)?;
    let checkout = scoped.checkout().to_path_buf();
    let roots: Vec<PathBuf> = scoped.roots().into_iter().map(Path::to_path_buf).collect();

    let pool = worker_pool(options)?;
    let entries: Vec<BulkEntry> = pool.install(|| {
        roots
            .par_iter()
            .map(|root| {
                let label = root
                    .strip_prefix(&checkout)
                    .unwrap_or(root)
                    .display()
                    .to_string();
                validate_root(root, label, pipeline, false)
            })
            .collect()
    });
    scoped.close()?;
    Ok(finish(entries))
}

fn finish(entries: Vec<BulkEntry>) -> BulkValidationReport {
    let report = BulkValidationReport { entries };
    tracing::info!(
        valid = report.valid_count(),
        total = report.len(),
        "bulk validation finished"
    );
    report
}

fn failed(source: String, err: &PackError) -> BulkEntry {
    tracing::warn!(source = %source, error = %err, "package could not be loaded");
    BulkEntry {
        source,
        package: None,
        outcome: BulkOutcome::Failed(err.to_string()),
    }
}

fn validate_root(
    root: &Path,
    source: String,
    pipeline: &ValidationPipeline,
    update_hash: bool,
) -> BulkEntry {
    let package = match PackageAssembler::new().build(root) {
        Ok(package) => package,
        Err(e) => return failed(source, &e),
    };
    let id = package.identifier().to_string();

    let outcome = match pipeline.validate(&package) {
        Ok(_) => BulkOutcome::Valid,
        Err(PackageValidationError::HashMismatch { expected, computed, .. }) if update_hash => {
            let previous = package.signature().map(|_| expected);
            let repaired = package.with_signature(PackageSignature::from(&computed));
            // Later steps may still reject the repaired package.
            match pipeline.validate(&repaired) {
                Ok(_) => match PackageSerializer::write_metadata(&repaired, root) {
                    Ok(_) => {
                        tracing::info!(package = %id, signature = %computed, "signature updated");
                        BulkOutcome::HashUpdated {
                            previous,
                            signature: PackageSignature::from(&computed),
                        }
                    }
                    Err(e) => BulkOutcome::Failed(e.to_string()),
                },
                Err(e) => BulkOutcome::Invalid(e.to_string()),
            }
        }
        Err(e) => BulkOutcome::Invalid(e.to_string()),
    };

    BulkEntry {
        source,
        package: Some(id),
        outcome,
    }
}
