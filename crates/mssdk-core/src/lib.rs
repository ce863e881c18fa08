//! # mssdk-core — Foundational Types for the Mapping Suite SDK
//!
//! This crate defines the value types every other SDK crate builds on: the
//! in-memory mapping package, its metadata record, the fixed on-disk layout,
//! and the canonicalization and digest primitives used to sign packages.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every structured value that enters a
//!    digest goes through `CanonicalBytes::new()` (RFC 8785). No raw
//!    `serde_json::to_vec()` on a digest path.
//!
//! 2. **`RelativePath` newtype.** Asset paths are validated at construction:
//!    relative, `/`-separated, no `..`. An asset can never resolve outside
//!    the package root it was loaded from.
//!
//! 3. **Explicit metadata aliasing.** The wire names of `metadata.json` are
//!    mapped to in-memory fields by one table, [`metadata::METADATA_FIELDS`].
//!
//! 4. **Immutable packages.** A [`MappingPackage`] is built once by the
//!    assembler or by deserializing a stored document. The only mutation is
//!    [`MappingPackage::with_signature`], which returns a new value.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mssdk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod path;

pub use canonical::CanonicalBytes;
pub use digest::{ContentDigest, DigestAlgorithm, FramedHasher};
pub use error::{CanonicalizationError, DigestParseError, MetadataError, PathError};
pub use layout::PackageSection;
pub use metadata::{PackageMetadata, PackageSignature, METADATA_FIELDS};
pub use model::{Asset, AssetCollection, AssetContent, MappingDialect, MappingPackage};
pub use path::RelativePath;
