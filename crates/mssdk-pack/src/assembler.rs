//! Package assembly from a root directory.

use std::path::Path;

use mssdk_core::MappingPackage;

use crate::error::{PackError, PackResult};
use crate::loader;

/// Loads a whole package from a directory known to exist.
pub trait PackageLoader: Send + Sync {
    fn load(&self, root: &Path) -> PackResult<MappingPackage>;
}

/// Loads every section through [`crate::loader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionLoader;

impl PackageLoader for SectionLoader {
    fn load(&self, root: &Path) -> PackResult<MappingPackage> {
        Ok(MappingPackage {
            metadata: loader::load_metadata(root)?,
            conceptual_mapping: loader::load_conceptual_mapping(root)?,
            technical_mapping_suite: loader::load_technical_mappings(root)?,
            vocabulary_mapping_suite: loader::load_vocabulary_mappings(root)?,
            test_data_suites: loader::load_test_data_suites(root)?,
            sparql_test_suites: loader::load_sparql_suites(root)?,
            shacl_test_suites: loader::load_shacl_suites(root)?,
            test_results: loader::load_test_results(root)?,
        })
    }
}

/// Builds a [`MappingPackage`] from a package root.
#[derive(Debug, Clone, Default)]
pub struct PackageAssembler<L = SectionLoader> {
    loader: L,
}

impl PackageAssembler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: PackageLoader> PackageAssembler<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    /// Assemble the package at `root`. Loader errors propagate unchanged.
    pub fn build(&self, root: &Path) -> PackResult<MappingPackage> {
        let _span = tracing::info_span!("assemble", root = %root.display()).entered();
        if !root.exists() {
            return Err(PackError::NotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(PackError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        let package = self.loader.load(root)?;
        tracing::debug!(package = package.identifier(), "package assembled");
        Ok(package)
    }
}
