//! # Error Types
//!
//! Leaf error types for the core crate. All use `thiserror`; higher crates
//! wrap them with path or source context.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A string could not be parsed as a content digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestParseError {
    /// Wrong number of hex characters.
    #[error("expected 64 hex characters, found {0}")]
    BadLength(usize),

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex character {ch:?} at offset {offset}")]
    BadCharacter { ch: char, offset: usize },

    /// The `algorithm:` prefix names an algorithm this crate does not produce.
    #[error("unsupported digest algorithm {0:?}")]
    UnsupportedAlgorithm(String),
}

/// A path could not be used as a package-relative asset path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path {0:?} is absolute")]
    Absolute(String),

    #[error("path {0:?} escapes the package root")]
    ParentTraversal(String),

    #[error("path {path:?} has an invalid segment {segment:?}")]
    InvalidSegment { path: String, segment: String },

    #[error("path {0:?} is not valid UTF-8")]
    NotUtf8(String),
}

/// The metadata document does not conform to the wire format.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The document root is not a JSON object.
    #[error("metadata document must be a JSON object")]
    NotAnObject,

    /// A required field is missing.
    #[error("metadata field {0:?} is required")]
    MissingField(&'static str),

    /// A field holds a value of the wrong JSON type.
    #[error("metadata field {field:?} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_error_display_names_the_path() {
        let err = PathError::ParentTraversal("a/../../b".to_string());
        assert!(err.to_string().contains("a/../../b"));
    }

    #[test]
    fn metadata_error_display_names_the_field() {
        let err = MetadataError::WrongType {
            field: "created_at",
            expected: "a string",
        };
        let msg = err.to_string();
        assert!(msg.contains("created_at"));
        assert!(msg.contains("a string"));
    }

    #[test]
    fn digest_parse_error_reports_offset() {
        let err = DigestParseError::BadCharacter { ch: 'z', offset: 7 };
        assert!(err.to_string().contains('7'));
    }
}
