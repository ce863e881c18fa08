//! Fixed on-disk layout of a mapping package.
//!
//! Every loader, serializer and the hasher name sections through
//! [`PackageSection`] rather than spelling paths themselves.

use crate::path::RelativePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageSection {
    ConceptualMapping,
    TechnicalMappings,
    VocabularyMappings,
    TestData,
    SparqlSuites,
    ShaclSuites,
    Metadata,
    TestResults,
}

impl PackageSection {
    pub const ALL: [PackageSection; 8] = [
        Self::ConceptualMapping,
        Self::TechnicalMappings,
        Self::VocabularyMappings,
        Self::TestData,
        Self::SparqlSuites,
        Self::ShaclSuites,
        Self::Metadata,
        Self::TestResults,
    ];

    /// Path of the section relative to the package root.
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::ConceptualMapping => "transformation/conceptual_mappings.xlsx",
            Self::TechnicalMappings => "transformation/mappings",
            Self::VocabularyMappings => "transformation/resources",
            Self::TestData => "test_data",
            Self::SparqlSuites => "validation/sparql",
            Self::ShaclSuites => "validation/shacl",
            Self::Metadata => "metadata.json",
            Self::TestResults => "output",
        }
    }

    /// The section path as a validated [`RelativePath`].
    pub fn path(self) -> RelativePath {
        RelativePath::from_static(self.relative_path())
    }

    /// Human-readable section name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::ConceptualMapping => "conceptual mapping",
            Self::TechnicalMappings => "technical mapping suite",
            Self::VocabularyMappings => "vocabulary mapping suite",
            Self::TestData => "test data suites",
            Self::SparqlSuites => "SPARQL test suites",
            Self::ShaclSuites => "SHACL test suites",
            Self::Metadata => "metadata",
            Self::TestResults => "test results",
        }
    }

    /// Whether the section is a single file rather than a directory.
    pub fn is_file(self) -> bool {
        matches!(self, Self::ConceptualMapping | Self::Metadata)
    }
}

impl std::fmt::Display for PackageSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
