//! # Metadata Wire Format Tests
//!
//! `metadata.json` documents are produced by other tools. These tests pin
//! the behaviour that keeps signatures stable across tools: alias mapping,
//! preservation of unknown keys, and a canonical hash input that is
//! independent of key order and formatting.

use mssdk_core::metadata::SIGNATURE_WIRE_NAME;
use mssdk_core::{CanonicalBytes, FramedHasher, PackageMetadata, PackageSignature};

const DOCUMENT: &str = r#"{
    "identifier": "package_eforms_16_1.5",
    "title": "Package EF16 v1.5",
    "created_at": "2024-02-29T14:02:51.282547",
    "description": "This is the conceptual mapping for eForms subtype 16.",
    "mapping_version": "3.0.0-alpha.1",
    "ontology_version": "4.0.0",
    "mapping_type": "eforms",
    "metadata_constraints": {
        "constraints": {
            "eforms_subtype": ["16"],
            "start_date": ["2023-11-01"],
            "eforms_sdk_versions": ["1.5"]
        }
    },
    "mapping_suite_hash_digest": "6c9d7e67b2dcfdf2b8d3a31b2d7f2c3f0ad9a2b6c0e0b4b9c8d1a4b5f1a2c3d4",
    "legacy_flag": true
}"#;

fn parse(text: &str) -> PackageMetadata {
    serde_json::from_str(text).expect("metadata document should parse")
}

fn hash_input_digest(meta: &PackageMetadata) -> String {
    let cb = CanonicalBytes::new(&meta.hash_input(None)).expect("metadata is canonicalizable");
    let mut hasher = FramedHasher::new(b"metadata\0");
    hasher.canonical(&cb);
    hasher.finalize().to_hex()
}

#[test]
fn realistic_document_loads() {
    let meta = parse(DOCUMENT);
    assert_eq!(meta.identifier, "package_eforms_16_1.5");
    assert_eq!(meta.mapping_type.as_deref(), Some("eforms"));
    assert_eq!(meta.issue_date.as_deref(), Some("2024-02-29T14:02:51.282547"));
    assert!(meta.signature.is_some());
    assert_eq!(meta.extra.get("legacy_flag"), Some(&serde_json::json!(true)));
}

#[test]
fn reserialized_document_is_semantically_identical() {
    let meta = parse(DOCUMENT);
    let written = serde_json::to_string_pretty(&meta).unwrap();
    let original: serde_json::Value = serde_json::from_str(DOCUMENT).unwrap();
    let rewritten: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(original, rewritten);
}

#[test]
fn hash_input_ignores_formatting_and_key_order() {
    let compact = serde_json::to_string(&serde_json::from_str::<serde_json::Value>(DOCUMENT).unwrap())
        .unwrap();
    assert_eq!(hash_input_digest(&parse(DOCUMENT)), hash_input_digest(&parse(&compact)));
}

#[test]
fn hash_input_ignores_signature() {
    let meta = parse(DOCUMENT);
    let mut resigned = meta.clone();
    resigned.signature = Some(PackageSignature::new("0".repeat(64)));
    assert_eq!(hash_input_digest(&meta), hash_input_digest(&resigned));
    assert!(meta.hash_input(None).get(SIGNATURE_WIRE_NAME).is_none());
}

#[test]
fn hash_input_tracks_description() {
    let meta = parse(DOCUMENT);
    let mut edited = meta.clone();
    edited.description = Some("changed".to_string());
    assert_ne!(hash_input_digest(&meta), hash_input_digest(&edited));
}
