//! # Mapping Package Data Model
//!
//! A package is a tree of named blobs plus a metadata record. Nothing here
//! interprets RML, SPARQL, SHACL or spreadsheet contents: every asset is
//! either text or raw bytes, and every path is a validated
//! [`RelativePath`] from the package root.

use serde::{Deserialize, Serialize};

use crate::metadata::{PackageMetadata, PackageSignature};
use crate::path::RelativePath;

/// Rule language of a technical mapping file, decided by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingDialect {
    Rml,
    Yarrrml,
}

impl MappingDialect {
    pub const RML_SUFFIXES: &'static [&'static str] = &[".ttl", ".rdf", ".n3"];
    pub const YARRRML_SUFFIXES: &'static [&'static str] = &[".yarrrml", ".yml", ".yaml"];

    /// Dialect for a suffix such as `".ttl"`; `None` if the file is not a
    /// technical mapping.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        if Self::RML_SUFFIXES.contains(&suffix) {
            Some(Self::Rml)
        } else if Self::YARRRML_SUFFIXES.contains(&suffix) {
            Some(Self::Yarrrml)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rml => "rml",
            Self::Yarrrml => "yarrrml",
        }
    }
}

/// Asset payload. Both variants are lossless; digests use [`AssetContent::as_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetContent {
    Text(String),
    Binary(Vec<u8>),
}

impl AssetContent {
    /// Text when the bytes are valid UTF-8, binary otherwise.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub path: RelativePath,
    pub content: AssetContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<MappingDialect>,
}

impl Asset {
    pub fn text(path: RelativePath, content: impl Into<String>) -> Self {
        Self {
            path,
            content: AssetContent::Text(content.into()),
            dialect: None,
        }
    }

    pub fn binary(path: RelativePath, content: Vec<u8>) -> Self {
        Self {
            path,
            content: AssetContent::Binary(content),
            dialect: None,
        }
    }

    pub fn with_dialect(mut self, dialect: MappingDialect) -> Self {
        self.dialect = Some(dialect);
        self
    }
}

/// A directory of assets. `path` is the directory, each file path is
/// relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCollection {
    pub path: RelativePath,
    pub files: Vec<Asset>,
}

impl AssetCollection {
    pub fn new(path: RelativePath, files: Vec<Asset>) -> Self {
        Self { path, files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Files ordered by path, the order they are hashed in.
    pub fn sorted_files(&self) -> Vec<&Asset> {
        let mut files: Vec<&Asset> = self.files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}

/// A complete mapping package.
///
/// Treat as immutable once built. Repairing a stale signature goes through
/// [`MappingPackage::with_signature`], which consumes the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingPackage {
    pub metadata: PackageMetadata,
    pub conceptual_mapping: Asset,
    pub technical_mapping_suite: AssetCollection,
    pub vocabulary_mapping_suite: AssetCollection,
    pub test_data_suites: Vec<AssetCollection>,
    pub sparql_test_suites: Vec<AssetCollection>,
    pub shacl_test_suites: Vec<AssetCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_results: Option<AssetCollection>,
}

impl MappingPackage {
    pub fn identifier(&self) -> &str {
        &self.metadata.identifier
    }

    pub fn signature(&self) -> Option<&PackageSignature> {
        self.metadata.signature.as_ref()
    }

    pub fn with_signature(mut self, signature: PackageSignature) -> Self {
        self.metadata.signature = Some(signature);
        self
    }
}
