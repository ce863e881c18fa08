//! # Package Validation
//!
//! A [`ValidationPipeline`] is an ordered list of [`ValidationStep`]s run
//! with short-circuit: the first failing step's error is returned as is.
//! The standard chain checks structure first, then the signature.

use mssdk_core::{CanonicalizationError, ContentDigest, MappingPackage, PackageSection};
use thiserror::Error;

use crate::hasher::PackageHasher;

#[derive(Debug, Error)]
pub enum PackageValidationError {
    /// One or more suites hold no files. Entries are suite paths, or the
    /// section path when the section has no suites at all.
    #[error("package {package} has empty suites: {}", .empty_suites.join(", "))]
    Structural {
        package: String,
        empty_suites: Vec<String>,
    },

    /// `expected` is the stored signature text, `"none"` when absent.
    #[error("package {package} signature mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        package: String,
        expected: String,
        computed: ContentDigest,
    },

    #[error("package {package} could not be hashed: {source}")]
    Hashing {
        package: String,
        source: CanonicalizationError,
    },

    /// Failure reported by a caller-supplied step.
    #[error("validation step {step} failed for {package}: {message}")]
    Step {
        step: String,
        package: String,
        message: String,
    },
}

impl PackageValidationError {
    pub fn package(&self) -> &str {
        match self {
            Self::Structural { package, .. }
            | Self::HashMismatch { package, .. }
            | Self::Hashing { package, .. }
            | Self::Step { package, .. } => package,
        }
    }
}

/// One check in a validation chain.
pub trait ValidationStep: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, package: &MappingPackage) -> Result<(), PackageValidationError>;
}

/// Every suite must hold at least one file, and every suite section at
/// least one suite.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidation;

impl StructuralValidation {
    /// Paths of the empty suites, in section order.
    pub fn empty_suites(package: &MappingPackage) -> Vec<String> {
        let mut empty = Vec::new();
        for suite in [
            &package.technical_mapping_suite,
            &package.vocabulary_mapping_suite,
        ] {
            if suite.is_empty() {
                empty.push(suite.path.to_string());
            }
        }
        for (section, suites) in [
            (PackageSection::TestData, &package.test_data_suites),
            (PackageSection::SparqlSuites, &package.sparql_test_suites),
            (PackageSection::ShaclSuites, &package.shacl_test_suites),
        ] {
            if suites.is_empty() {
                empty.push(section.relative_path().to_string());
            }
            empty.extend(
                suites
                    .iter()
                    .filter(|s| s.is_empty())
                    .map(|s| s.path.to_string()),
            );
        }
        empty
    }
}

impl ValidationStep for StructuralValidation {
    fn name(&self) -> &str {
        "structural"
    }

    fn check(&self, package: &MappingPackage) -> Result<(), PackageValidationError> {
        let empty_suites = Self::empty_suites(package);
        if empty_suites.is_empty() {
            Ok(())
        } else {
            Err(PackageValidationError::Structural {
                package: package.identifier().to_string(),
                empty_suites,
            })
        }
    }
}

/// The stored signature must equal the computed package digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashValidation;

impl ValidationStep for HashValidation {
    fn name(&self) -> &str {
        "hash"
    }

    fn check(&self, package: &MappingPackage) -> Result<(), PackageValidationError> {
        let computed =
            PackageHasher::hash(package, None).map_err(|source| PackageValidationError::Hashing {
                package: package.identifier().to_string(),
                source,
            })?;
        match package.signature() {
            Some(signature) if signature.matches(&computed) => Ok(()),
            stored => Err(PackageValidationError::HashMismatch {
                package: package.identifier().to_string(),
                expected: stored.map_or_else(|| "none".to_string(), |s| s.to_string()),
                computed,
            }),
        }
    }
}

pub struct ValidationPipeline {
    steps: Vec<Box<dyn ValidationStep>>,
}

impl ValidationPipeline {
    /// Structural validation, then hash validation.
    pub fn standard() -> Self {
        Self::with_steps(vec![
            Box::new(StructuralValidation),
            Box::new(HashValidation),
        ])
    }

    /// A pipeline with no steps; every package passes.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn with_steps(steps: Vec<Box<dyn ValidationStep>>) -> Self {
        Self { steps }
    }

    pub fn push(mut self, step: impl ValidationStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order. Returns `Ok(true)` when all pass.
    pub fn validate(&self, package: &MappingPackage) -> Result<bool, PackageValidationError> {
        let _span = tracing::info_span!("validate", package = package.identifier()).entered();
        for step in &self.steps {
            if let Err(err) = step.check(package) {
                tracing::info!(step = step.name(), error = %err, "validation failed");
                return Err(err);
            }
            tracing::debug!(step = step.name(), "validation step passed");
        }
        Ok(true)
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}
