//! Canonical projection and semantic fingerprint
//!
//! The canonical form is the external contract that makes re-verification
//! meaningful: a downstream party given the projection fields and the
//! serialization rules (sorted keys, UTF-8, no insignificant whitespace,
//! integer amounts, NFC strings) can reproduce the fingerprint
//! byte-for-byte. Timestamps, UUIDs, confidence scores, OCR statistics and
//! recommendation text never enter the projection.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use proptrust_common::types::Fingerprint;

use crate::models::{Classification, EntityBundle};

/// Inputs to one fingerprint computation.
#[derive(Debug, Clone)]
pub struct CanonicalInput<'a> {
    pub property_id: &'a str,
    pub entities: &'a EntityBundle,
    pub risk_score: u8,
    /// Raw classifier output; the floor is applied during projection so
    /// below-floor model drift cannot move the fingerprint.
    pub classification: &'a Classification,
    pub classification_floor: f64,
}

/// Standard fingerprint: SHA-256 over the canonical bytes, risk score included.
pub fn fingerprint(input: &CanonicalInput<'_>) -> Fingerprint {
    digest(&canonical_bytes(input, true))
}

/// Comparison fingerprint: identical projection minus `risk_score`. Used by
/// the tamper checker to distinguish a re-scored document from an edited one.
pub fn comparison_fingerprint(input: &CanonicalInput<'_>) -> Fingerprint {
    digest(&canonical_bytes(input, false))
}

/// Serialize the canonical projection: recursively key-sorted JSON with no
/// insignificant whitespace, encoded as UTF-8.
pub fn canonical_bytes(input: &CanonicalInput<'_>, include_risk_score: bool) -> Vec<u8> {
    let value = canonical_value(input, include_risk_score);
    serde_json::to_vec(&sort_keys(value)).expect("canonical projection serializes")
}

/// The canonical projection as a field map (risk score excluded), for
/// field-level diffing during tamper checks.
pub fn canonical_fields(input: &CanonicalInput<'_>) -> Value {
    sort_keys(canonical_value(input, false))
}

fn canonical_value(input: &CanonicalInput<'_>, include_risk_score: bool) -> Value {
    let entities = input.entities;
    let mut map = Map::new();

    map.insert("property_id".into(), Value::from(nfc(input.property_id)));
    map.insert("owner".into(), Value::from(normalize_name(entities.owner.as_deref())));
    map.insert(
        "survey_number".into(),
        Value::from(normalize_survey(entities.survey_number.as_deref())),
    );
    map.insert(
        "hissa_number".into(),
        Value::from(normalize_survey(entities.hissa_number.as_deref())),
    );
    map.insert("village".into(), Value::from(opt_nfc(entities.village.as_deref())));
    map.insert("taluk".into(), Value::from(opt_nfc(entities.taluk.as_deref())));
    map.insert("district".into(), Value::from(opt_nfc(entities.district.as_deref())));
    map.insert(
        "extent_acres".into(),
        Value::from(entities.extent_acres.unwrap_or(0)),
    );
    map.insert(
        "extent_guntas".into(),
        Value::from(entities.extent_guntas.unwrap_or(0)),
    );

    // Loans reduce to {amount, bank}, ordered by amount descending then bank;
    // context text is presentation, not identity.
    let mut loans: Vec<(i64, String)> = entities
        .loans
        .iter()
        .map(|l| (l.amount, l.bank.as_deref().map(nfc).unwrap_or_default()))
        .collect();
    loans.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    map.insert(
        "loans".into(),
        Value::Array(
            loans
                .into_iter()
                .map(|(amount, bank)| {
                    let mut loan = Map::new();
                    loan.insert("amount".into(), Value::from(amount));
                    loan.insert("bank".into(), Value::from(bank));
                    Value::Object(loan)
                })
                .collect(),
        ),
    );

    let mut cases: Vec<String> = entities.case_numbers.iter().map(|c| nfc(c)).collect();
    cases.sort();
    map.insert(
        "case_numbers".into(),
        Value::Array(cases.into_iter().map(Value::from).collect()),
    );

    if include_risk_score {
        map.insert("risk_score".into(), Value::from(input.risk_score));
    }

    let label = if input.classification.confidence >= input.classification_floor {
        input.classification.label.as_str().to_string()
    } else {
        String::new()
    };
    map.insert("classification_label".into(), Value::from(label));

    Value::Object(map)
}

/// Owner names hash as uppercase with collapsed whitespace so OCR case and
/// spacing jitter does not move the fingerprint.
fn normalize_name(name: Option<&str>) -> String {
    match name {
        None => String::new(),
        Some(n) => nfc(n)
            .to_uppercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Survey and hissa numbers hash as uppercase with all spaces removed.
fn normalize_survey(value: Option<&str>) -> String {
    match value {
        None => String::new(),
        Some(v) => nfc(v).to_uppercase().replace(' ', ""),
    }
}

fn nfc(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_string()
}

fn opt_nfc(s: Option<&str>) -> String {
    s.map(nfc).unwrap_or_default()
}

fn digest(bytes: &[u8]) -> Fingerprint {
    let hash = Sha256::digest(bytes);
    Fingerprint::from_bytes(hash.into())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
