//! # Package Metadata
//!
//! `metadata.json` uses historical wire names that differ from the
//! in-memory field names (`created_at` is the issue date,
//! `mapping_suite_hash_digest` is the signature, ...). The correspondence
//! lives in exactly one place, [`METADATA_FIELDS`], and both directions of
//! the conversion are driven by it.
//!
//! Keys the table does not know are kept in [`PackageMetadata::extra`] and
//! written back unchanged, so a document produced by a newer tool survives
//! a load/serialize round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::digest::ContentDigest;
use crate::error::MetadataError;

/// In-memory slot a wire key is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    Identifier,
    Title,
    Description,
    IssueDate,
    MappingType,
    MappingVersion,
    OntologyVersion,
    Source,
    Target,
    EligibilityConstraints,
    Signature,
}

/// One row of the wire/in-memory alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataField {
    pub wire: &'static str,
    pub field: &'static str,
    pub slot: FieldSlot,
}

/// Wire name to in-memory field name, in document order.
pub const METADATA_FIELDS: &[MetadataField] = &[
    MetadataField { wire: "identifier", field: "identifier", slot: FieldSlot::Identifier },
    MetadataField { wire: "title", field: "title", slot: FieldSlot::Title },
    MetadataField { wire: "description", field: "description", slot: FieldSlot::Description },
    MetadataField { wire: "created_at", field: "issue_date", slot: FieldSlot::IssueDate },
    MetadataField { wire: "mapping_type", field: "mapping_type", slot: FieldSlot::MappingType },
    MetadataField { wire: "mapping_version", field: "mapping_version", slot: FieldSlot::MappingVersion },
    MetadataField { wire: "ontology_version", field: "ontology_version", slot: FieldSlot::OntologyVersion },
    MetadataField { wire: "source", field: "source", slot: FieldSlot::Source },
    MetadataField { wire: "target", field: "target", slot: FieldSlot::Target },
    MetadataField { wire: "metadata_constraints", field: "eligibility_constraints", slot: FieldSlot::EligibilityConstraints },
    MetadataField { wire: "mapping_suite_hash_digest", field: "signature", slot: FieldSlot::Signature },
];

/// Wire name of the signature field.
pub const SIGNATURE_WIRE_NAME: &str = "mapping_suite_hash_digest";

/// Wire name of the mapping version field.
pub const VERSION_WIRE_NAME: &str = "mapping_version";

/// Look up the wire name for an in-memory field.
pub fn wire_name(field: &str) -> Option<&'static str> {
    METADATA_FIELDS.iter().find(|f| f.field == field).map(|f| f.wire)
}

/// The stored integrity signature, kept verbatim.
///
/// The text is preserved exactly as found so that a document with an
/// unparseable signature still round-trips; such a signature simply never
/// matches a computed digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSignature(String);

impl PackageSignature {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the stored text as a digest.
    pub fn decode(&self) -> Option<ContentDigest> {
        ContentDigest::from_hex(&self.0).ok()
    }

    /// True when the stored text denotes exactly `digest`.
    pub fn matches(&self, digest: &ContentDigest) -> bool {
        self.decode().as_ref() == Some(digest)
    }
}

impl From<&ContentDigest> for PackageSignature {
    fn from(digest: &ContentDigest) -> Self {
        Self(digest.to_hex())
    }
}

impl std::fmt::Display for PackageSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The package metadata record.
///
/// Only `identifier` is required. Eligibility constraints, source and
/// target descriptors are open JSON objects carried without
/// interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub identifier: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_date: Option<String>,
    pub mapping_type: Option<String>,
    pub mapping_version: Option<String>,
    pub ontology_version: Option<String>,
    pub source: Option<Map<String, Value>>,
    pub target: Option<Map<String, Value>>,
    pub eligibility_constraints: Option<Map<String, Value>>,
    pub signature: Option<PackageSignature>,
    /// Unrecognised wire keys, preserved verbatim.
    pub extra: BTreeMap<String, Value>,
}

impl PackageMetadata {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Parse a metadata document.
    pub fn from_wire(document: Value) -> Result<Self, MetadataError> {
        let Value::Object(map) = document else {
            return Err(MetadataError::NotAnObject);
        };
        let mut meta = PackageMetadata::default();
        let mut has_identifier = false;
        for (key, value) in map {
            match METADATA_FIELDS.iter().find(|f| f.wire == key) {
                Some(entry) => {
                    has_identifier |= entry.slot == FieldSlot::Identifier;
                    meta.store(entry, value)?;
                }
                None => {
                    meta.extra.insert(key, value);
                }
            }
        }
        if !has_identifier {
            return Err(MetadataError::MissingField("identifier"));
        }
        Ok(meta)
    }

    fn store(&mut self, entry: &MetadataField, value: Value) -> Result<(), MetadataError> {
        if value.is_null() && entry.slot != FieldSlot::Identifier {
            return Ok(());
        }
        let text = |value: Value| match value {
            Value::String(s) => Ok(s),
            _ => Err(MetadataError::WrongType {
                field: entry.wire,
                expected: "a string",
            }),
        };
        let object = |value: Value| match value {
            Value::Object(m) => Ok(m),
            _ => Err(MetadataError::WrongType {
                field: entry.wire,
                expected: "an object",
            }),
        };
        match entry.slot {
            FieldSlot::Identifier => self.identifier = text(value)?,
            FieldSlot::Title => self.title = Some(text(value)?),
            FieldSlot::Description => self.description = Some(text(value)?),
            FieldSlot::IssueDate => self.issue_date = Some(text(value)?),
            FieldSlot::MappingType => self.mapping_type = Some(text(value)?),
            FieldSlot::MappingVersion => self.mapping_version = Some(text(value)?),
            FieldSlot::OntologyVersion => self.ontology_version = Some(text(value)?),
            FieldSlot::Source => self.source = Some(object(value)?),
            FieldSlot::Target => self.target = Some(object(value)?),
            FieldSlot::EligibilityConstraints => {
                self.eligibility_constraints = Some(object(value)?)
            }
            FieldSlot::Signature => self.signature = Some(PackageSignature(text(value)?)),
        }
        Ok(())
    }

    fn load(&self, slot: FieldSlot) -> Option<Value> {
        match slot {
            FieldSlot::Identifier => Some(Value::String(self.identifier.clone())),
            FieldSlot::Title => self.title.clone().map(Value::String),
            FieldSlot::Description => self.description.clone().map(Value::String),
            FieldSlot::IssueDate => self.issue_date.clone().map(Value::String),
            FieldSlot::MappingType => self.mapping_type.clone().map(Value::String),
            FieldSlot::MappingVersion => self.mapping_version.clone().map(Value::String),
            FieldSlot::OntologyVersion => self.ontology_version.clone().map(Value::String),
            FieldSlot::Source => self.source.clone().map(Value::Object),
            FieldSlot::Target => self.target.clone().map(Value::Object),
            FieldSlot::EligibilityConstraints => {
                self.eligibility_constraints.clone().map(Value::Object)
            }
            FieldSlot::Signature => self.signature.as_ref().map(|s| Value::String(s.0.clone())),
        }
    }

    /// Render the wire document. Absent optional fields are omitted.
    pub fn to_wire(&self) -> Value {
        let mut map: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for entry in METADATA_FIELDS {
            if let Some(value) = self.load(entry.slot) {
                map.insert(entry.wire.to_string(), value);
            }
        }
        Value::Object(map)
    }

    /// The wire document as it enters the package digest: no signature,
    /// and `mapping_version` replaced when `with_version` is given.
    pub fn hash_input(&self, with_version: Option<&str>) -> Value {
        let mut document = self.to_wire();
        if let Value::Object(map) = &mut document {
            map.remove(SIGNATURE_WIRE_NAME);
            if let Some(version) = with_version {
                map.insert(VERSION_WIRE_NAME.to_string(), Value::String(version.to_string()));
            }
        }
        document
    }
}

impl Serialize for PackageMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackageMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = Value::deserialize(deserializer)?;
        Self::from_wire(document).map_err(serde::de::Error::custom)
    }
}
