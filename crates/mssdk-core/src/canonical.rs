//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only way structured data (today: the package
//! metadata record) enters a package digest. Two packages whose metadata
//! documents differ only in key order or whitespace must hash identically,
//! so the record is re-serialized with RFC 8785 (JSON Canonicalization
//! Scheme) before hashing: sorted keys, compact separators, UTF-8 output.
//!
//! Numbers are written in the RFC 8785 (ECMAScript) form, so `1.50`,
//! `1.5` and `15e-1` in a source document all canonicalize to `1.5`, and
//! an integral float such as `2.0` to `2`. Any JSON value is accepted.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// The inner buffer is private; the only constructor is
/// [`CanonicalBytes::new`], so a function that takes `&CanonicalBytes`
/// cannot be handed bytes from any other serialization path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `CanonicalizationError::SerializationFailed` if the value cannot be
    /// represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let bytes = serialize_canonical(&value)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_str(value: &Value) -> String {
        let cb = CanonicalBytes::new(value).expect("should canonicalize");
        String::from_utf8(cb.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn metadata_keys_are_sorted() {
        let data = serde_json::json!({
            "title": "Package F03",
            "identifier": "package_f03",
            "mapping_version": "1.0.0"
        });
        assert_eq!(
            canonical_str(&data),
            r#"{"identifier":"package_f03","mapping_version":"1.0.0","title":"Package F03"}"#
        );
    }

    #[test]
    fn nested_constraints_are_sorted() {
        let data = serde_json::json!({
            "metadata_constraints": {
                "constraints": {"min_xsd_version": ["R2.0.9.S01.E01"], "eforms_subtype": ["3"]}
            },
            "a": [3, 2, 1]
        });
        assert_eq!(
            canonical_str(&data),
            r#"{"a":[3,2,1],"metadata_constraints":{"constraints":{"eforms_subtype":["3"],"min_xsd_version":["R2.0.9.S01.E01"]}}}"#
        );
    }

    #[test]
    fn whitespace_and_key_order_do_not_matter() {
        let a: Value = serde_json::from_str("{\"b\": 1,\n  \"a\": \"x\"}").unwrap();
        let b: Value = serde_json::from_str(r#"{"a":"x","b":1}"#).unwrap();
        assert_eq!(
            CanonicalBytes::new(&a).unwrap(),
            CanonicalBytes::new(&b).unwrap()
        );
    }

    #[test]
    fn floats_use_ecmascript_form() {
        let data = serde_json::json!({"constraints": {"weight": 1.5, "threshold": 0.5}});
        assert_eq!(
            canonical_str(&data),
            r#"{"constraints":{"threshold":0.5,"weight":1.5}}"#
        );
        let big: Value = serde_json::from_str(r#"{"n": 1e21, "m": 2.0}"#).unwrap();
        assert_eq!(canonical_str(&big), r#"{"m":2,"n":1e+21}"#);
    }

    #[test]
    fn float_spellings_canonicalize_alike() {
        let a: Value = serde_json::from_str(r#"{"w": 1.50}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"w": 15e-1}"#).unwrap();
        assert_eq!(
            CanonicalBytes::new(&a).unwrap(),
            CanonicalBytes::new(&b).unwrap()
        );
    }

    #[test]
    fn integers_null_and_bools_pass_through() {
        let data = serde_json::json!({"n": -42, "big": 9999999999i64, "z": null, "t": true});
        assert_eq!(
            canonical_str(&data),
            r#"{"big":9999999999,"n":-42,"t":true,"z":null}"#
        );
    }

    #[test]
    fn empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 2);
    }

    #[test]
    fn unicode_is_emitted_as_utf8() {
        let data = serde_json::json!({"title": "Avis de marché"});
        assert!(canonical_str(&data).contains("marché"));
    }
}
