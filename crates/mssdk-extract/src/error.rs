//! Extraction error types.
//!
//! Every variant carries the archive path, URL or pattern it concerns so a
//! bulk report line is actionable on its own.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Caller error, raised before any filesystem or network access.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("source not found: {path}")]
    NotFound { path: PathBuf },

    #[error("source is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The container could not be read or written.
    #[error("failed to extract archive {archive}: {source}")]
    Archive {
        archive: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("unsupported archive format: {path} (expected .zip, .tar, .tar.gz or .tgz)")]
    UnsupportedFormat { path: PathBuf },

    /// An archive entry would be written outside the destination, or is a
    /// link.
    #[error("archive {archive} contains an unsafe entry: {entry}")]
    UnsafeEntry { archive: PathBuf, entry: String },

    /// `extract` never writes into a checkout directory it did not create.
    #[error("checkout directory already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("repository unreachable: {url}: {detail}")]
    RepositoryUnreachable { url: String, detail: String },

    #[error("branch or tag {reference:?} not found in {url}")]
    RefNotFound { url: String, reference: String },

    #[error("package path {package_path} not found in checkout of {url}")]
    PackagePathNotFound { url: String, package_path: PathBuf },

    #[error("pattern {pattern:?} matched no package directories in {url}")]
    NoPackagesMatched { url: String, pattern: String },

    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("git {operation} failed: {detail}")]
    Git { operation: &'static str, detail: String },

    #[error("extraction cancelled")]
    Cancelled,

    #[error("extraction timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(
        archive: impl Into<PathBuf>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Archive {
            archive: archive.into(),
            source: source.into(),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
