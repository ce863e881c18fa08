//! Package error types.
//!
//! Loading, serialization and service errors carry the filesystem path they
//! concern. Validation outcomes have their own type in
//! [`crate::validation`] and repository failures in [`crate::repository`].

use std::path::PathBuf;

use mssdk_core::{CanonicalizationError, MetadataError, PackageSection, PathError};
use mssdk_extract::ExtractError;
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::validation::PackageValidationError;

#[derive(Debug, Error)]
pub enum PackError {
    /// Caller error, raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("mapping package not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A section the layout requires is absent from the package root.
    #[error("{section} not found at {path}")]
    SectionNotFound {
        section: PackageSection,
        path: PathBuf,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid metadata at {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: MetadataError,
    },

    /// Package content must be regular files and directories under the root.
    #[error("symbolic link inside package: {path}")]
    SymbolicLink { path: PathBuf },

    #[error("invalid asset path under {root}: {source}")]
    InvalidPath { root: PathBuf, source: PathError },

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Validation(#[from] PackageValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to start validation workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for package operations.
pub type PackResult<T> = Result<T, PackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = PackError::NotFound {
            path: PathBuf::from("/tmp/missing_pkg"),
        };
        assert!(err.to_string().contains("/tmp/missing_pkg"));
    }

    #[test]
    fn section_not_found_names_section() {
        let err = PackError::SectionNotFound {
            section: PackageSection::SparqlSuites,
            path: PathBuf::from("/pkg/validation/sparql"),
        };
        let msg = err.to_string();
        assert!(msg.contains("SPARQL test suites"));
        assert!(msg.contains("/pkg/validation/sparql"));
    }

    #[test]
    fn extraction_error_is_transparent() {
        let err: PackError = ExtractError::Cancelled.into();
        assert_eq!(err.to_string(), "extraction cancelled");
    }
}
