//! # Content Digest
//!
//! `ContentDigest` is the value a package signature is compared against.
//! It is produced from a framed record stream via [`FramedHasher`], which
//! mixes canonical structured data with raw asset bytes.
//!
//! ## Framing
//!
//! A plain concatenation of paths and contents is ambiguous: the pair
//! (`"ab"`, `"c"`) and (`"a"`, `"bc"`) feed identical bytes. `FramedHasher`
//! writes every field as a big-endian `u64` length followed by the bytes,
//! and every record starts with a one-byte tag, so distinct record streams
//! never collide on input.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::DigestParseError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    pub algorithm: DigestAlgorithm,
    pub bytes: [u8; 32],
}

impl ContentDigest {
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    ///
    /// This is the form stored in `metadata.json` as
    /// `mapping_suite_hash_digest`.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a stored digest.
    ///
    /// Accepts bare hex (either case) or the `sha256:<hex>` display form.
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        let hex = match s.split_once(':') {
            Some((algorithm, rest)) if algorithm == DigestAlgorithm::Sha256.as_str() => rest,
            Some((algorithm, _)) => {
                return Err(DigestParseError::UnsupportedAlgorithm(algorithm.to_string()))
            }
            None => s,
        };
        if hex.len() != 64 {
            return Err(DigestParseError::BadLength(hex.chars().count()));
        }
        let mut bytes = [0u8; 32];
        let raw = hex.as_bytes();
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_value(raw[2 * i], 2 * i)?;
            let lo = hex_value(raw[2 * i + 1], 2 * i + 1)?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }
}

fn hex_value(c: u8, offset: usize) -> Result<u8, DigestParseError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(DigestParseError::BadCharacter {
            ch: char::from(c),
            offset,
        }),
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Incremental SHA-256 over tagged, length-prefixed records.
///
/// Construction writes a domain tag so digests from different record
/// schemas can never be confused with one another.
#[derive(Clone)]
pub struct FramedHasher {
    inner: Sha256,
}

impl FramedHasher {
    pub fn new(domain_tag: &[u8]) -> Self {
        let mut inner = Sha256::new();
        inner.update(domain_tag);
        Self { inner }
    }

    /// Start a record.
    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.inner.update([tag]);
        self
    }

    /// Append a length-prefixed field.
    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update((bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
        self
    }

    /// Append a length-prefixed canonical structure.
    pub fn canonical(&mut self, data: &CanonicalBytes) -> &mut Self {
        self.field(data.as_bytes())
    }

    /// Append a fixed-width count.
    pub fn count(&mut self, n: u64) -> &mut Self {
        self.inner.update(n.to_be_bytes());
        self
    }

    pub fn finalize(self) -> ContentDigest {
        let hash = self.inner.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest::new(DigestAlgorithm::Sha256, bytes)
    }
}

impl std::fmt::Debug for FramedHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedHasher").finish_non_exhaustive()
    }
}
