//! # mssdk-pack — Mapping Package Operations
//!
//! Everything that happens to a package once its bytes are on disk:
//!
//! - [`loader`] / [`assembler`]: read the fixed layout into a
//!   [`MappingPackage`](mssdk_core::MappingPackage).
//! - [`hasher`]: the deterministic package digest that backs the signature.
//! - [`validation`]: the ordered validation chain (structure, then signature).
//! - [`serializer`]: write a package back to the layout.
//! - [`repository`]: persist whole packages as JSON documents.
//! - [`bulk`]: validate many packages in parallel and report on each.
//! - [`service`]: one-call entry points over folders, archives, git and
//!   repositories.
//!
//! Acquisition of archives and git checkouts lives in `mssdk-extract`; this
//! crate only consumes the scoped directories it returns.

pub mod assembler;
pub mod bulk;
pub mod error;
pub mod hasher;
pub mod loader;
pub mod repository;
pub mod serializer;
pub mod service;
pub mod validation;

pub use assembler::{PackageAssembler, PackageLoader, SectionLoader};
pub use bulk::{
    validate_bulk_from_archives, validate_bulk_from_folder, validate_bulk_from_git, BulkEntry,
    BulkOptions, BulkOutcome, BulkValidationReport,
};
pub use error::{PackError, PackResult};
pub use hasher::{PackageHasher, PACKAGE_DIGEST_DOMAIN};
pub use repository::{
    FsPackageRepository, InMemoryPackageRepository, MetadataFilter, PackageRepository,
    RepositoryError, RepositoryResult,
};
pub use serializer::PackageSerializer;
pub use service::{
    load_from_archive, load_from_folder, load_from_git, load_from_repository, load_packages,
    serialize_to_archive, validate_from_archive, validate_package, PackageService, PackageSource,
};
pub use validation::{
    HashValidation, PackageValidationError, StructuralValidation, ValidationPipeline,
    ValidationStep,
};
