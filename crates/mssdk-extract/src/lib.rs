//! # mssdk-extract — Package Source Extraction
//!
//! Turns a package source (an archive file or a git repository) into one or
//! more package root directories on the local filesystem, each owned by a
//! scoped guard that removes it on drop.
//!
//! - [`ArchiveExtractor`]: zip / tar / tar.gz, plus packing a directory back
//!   into an archive.
//! - [`GitExtractor`]: shallow clone at a branch or tag, package directories
//!   selected by glob pattern.
//!
//! Both implement [`SourceExtractor`], so callers that only need "give me
//! the package roots for this source" can be written once.

pub mod archive;
pub mod error;
pub mod git;
mod process;
pub mod scoped;

use std::path::Path;

pub use archive::{ArchiveExtractor, ArchiveFormat};
pub use error::{ExtractError, ExtractResult};
pub use git::GitExtractor;
pub use scoped::{ScopedDir, ScopedPackages};
pub use tokio_util::sync::CancellationToken;

/// A scoped extraction result exposing its package roots.
pub trait PackageRoots {
    fn roots(&self) -> Vec<&Path>;
}

impl PackageRoots for ScopedDir {
    fn roots(&self) -> Vec<&Path> {
        vec![self.path()]
    }
}

impl PackageRoots for ScopedPackages {
    fn roots(&self) -> Vec<&Path> {
        self.package_roots().iter().map(|p| p.as_path()).collect()
    }
}

/// Where to find packages in a git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    pub url: String,
    pub pattern: String,
    pub reference: Option<String>,
}

impl GitSource {
    pub fn new(url: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pattern: pattern.into(),
            reference: None,
        }
    }

    pub fn at(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// The extractor family: acquire a source into a scoped directory.
pub trait SourceExtractor {
    type Source: ?Sized;
    type Scoped: PackageRoots;

    fn extract_temporary(&self, source: &Self::Source) -> ExtractResult<Self::Scoped>;
}

impl SourceExtractor for ArchiveExtractor {
    type Source = Path;
    type Scoped = ScopedDir;

    fn extract_temporary(&self, source: &Path) -> ExtractResult<ScopedDir> {
        ArchiveExtractor::extract_temporary(self, source)
    }
}

impl SourceExtractor for GitExtractor {
    type Source = GitSource;
    type Scoped = ScopedPackages;

    fn extract_temporary(&self, source: &GitSource) -> ExtractResult<ScopedPackages> {
        GitExtractor::extract_temporary(
            self,
            &source.url,
            &source.pattern,
            source.reference.as_deref(),
        )
    }
}
