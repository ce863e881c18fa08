//! Scoped temporary directories.
//!
//! A scoped directory is fully populated when handed to the caller and is
//! removed when the guard drops: normal return, early `?` return, or panic
//! unwind. Callers that want to see removal errors call `close()`.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ExtractError, ExtractResult};

const TEMP_PREFIX: &str = "mssdk-";

/// A temporary directory holding one extracted package.
#[derive(Debug)]
pub struct ScopedDir {
    dir: TempDir,
}

impl ScopedDir {
    /// A fresh directory under `parent`, or the system temp dir if `None`.
    pub(crate) fn create_in(parent: Option<&Path>) -> ExtractResult<Self> {
        let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| ExtractError::io(parent, e))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures.
    pub fn close(self) -> ExtractResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| ExtractError::io(path, e))
    }
}

impl AsRef<Path> for ScopedDir {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// A temporary checkout and the package directories selected inside it.
///
/// Every path in [`ScopedPackages::package_roots`] lives under the
/// checkout and disappears with it.
#[derive(Debug)]
pub struct ScopedPackages {
    checkout: ScopedDir,
    package_roots: Vec<PathBuf>,
}

impl ScopedPackages {
    pub(crate) fn new(checkout: ScopedDir, package_roots: Vec<PathBuf>) -> Self {
        Self {
            checkout,
            package_roots,
        }
    }

    /// Root of the temporary checkout.
    pub fn checkout(&self) -> &Path {
        self.checkout.path()
    }

    /// Matched package directories, sorted.
    pub fn package_roots(&self) -> &[PathBuf] {
        &self.package_roots
    }

    pub fn close(self) -> ExtractResult<()> {
        self.checkout.close()
    }
}
