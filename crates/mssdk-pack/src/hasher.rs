//! # Package Digest
//!
//! The package signature is a SHA-256 over a framed record stream:
//!
//! ```text
//! DOMAIN
//! META     len(canonical metadata) canonical metadata
//! ASSET    len(path) path  len(bytes) bytes            conceptual mapping
//! SECTION  len(name) name  count                       technical suite
//!   COLLECTION len(path) path count
//!     ASSET ...                                        files sorted by path
//! SECTION ...                                          vocabulary suite
//! SECTION ...                                          test data suites
//! SECTION ...                                          SPARQL suites
//! SECTION ...                                          SHACL suites
//! ```
//!
//! Metadata enters in RFC 8785 canonical form with the signature removed,
//! so key order in `metadata.json` never changes the digest. Test results
//! are not part of the stream.

use mssdk_core::{
    Asset, AssetCollection, CanonicalBytes, CanonicalizationError, ContentDigest, FramedHasher,
    MappingPackage, PackageSection, PackageSignature,
};

/// Domain separator written before any record.
pub const PACKAGE_DIGEST_DOMAIN: &[u8] = b"mssdk-package-v1\0";

const TAG_META: u8 = 0x01;
const TAG_SECTION: u8 = 0x02;
const TAG_COLLECTION: u8 = 0x03;
const TAG_ASSET: u8 = 0x04;

/// Computes package digests. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageHasher;

impl PackageHasher {
    /// Digest of `package`. When `with_version` is given it replaces the
    /// metadata `mapping_version` before hashing.
    pub fn hash(
        package: &MappingPackage,
        with_version: Option<&str>,
    ) -> Result<ContentDigest, CanonicalizationError> {
        let _span = tracing::info_span!("hash", package = package.identifier()).entered();

        let metadata = CanonicalBytes::new(&package.metadata.hash_input(with_version))?;
        let mut hasher = FramedHasher::new(PACKAGE_DIGEST_DOMAIN);
        hasher.tag(TAG_META).canonical(&metadata);

        feed_asset(&mut hasher, &package.conceptual_mapping);
        feed_section(
            &mut hasher,
            PackageSection::TechnicalMappings,
            std::slice::from_ref(&package.technical_mapping_suite),
        );
        feed_section(
            &mut hasher,
            PackageSection::VocabularyMappings,
            std::slice::from_ref(&package.vocabulary_mapping_suite),
        );
        feed_section(&mut hasher, PackageSection::TestData, &package.test_data_suites);
        feed_section(&mut hasher, PackageSection::SparqlSuites, &package.sparql_test_suites);
        feed_section(&mut hasher, PackageSection::ShaclSuites, &package.shacl_test_suites);

        let digest = hasher.finalize();
        tracing::debug!(digest = %digest, "package hashed");
        Ok(digest)
    }

    /// The signature a package should carry.
    pub fn signature(package: &MappingPackage) -> Result<PackageSignature, CanonicalizationError> {
        Ok(PackageSignature::from(&Self::hash(package, None)?))
    }

    /// True when the stored signature matches the computed digest. A missing
    /// or unparseable signature never matches.
    pub fn verify(package: &MappingPackage) -> Result<bool, CanonicalizationError> {
        let computed = Self::hash(package, None)?;
        Ok(package
            .signature()
            .is_some_and(|signature| signature.matches(&computed)))
    }
}

fn feed_section(hasher: &mut FramedHasher, section: PackageSection, collections: &[AssetCollection]) {
    let mut ordered: Vec<&AssetCollection> = collections.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    hasher
        .tag(TAG_SECTION)
        .field(section.relative_path().as_bytes())
        .count(ordered.len() as u64);
    for collection in ordered {
        let files = collection.sorted_files();
        hasher
            .tag(TAG_COLLECTION)
            .field(collection.path.as_str().as_bytes())
            .count(files.len() as u64);
        for asset in files {
            feed_asset(hasher, asset);
        }
    }
}

fn feed_asset(hasher: &mut FramedHasher, asset: &Asset) {
    hasher
        .tag(TAG_ASSET)
        .field(asset.path.as_str().as_bytes())
        .field(asset.content.as_bytes());
}
