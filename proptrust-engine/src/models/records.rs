//! Persistent record types
//!
//! Rows are immutable once written; updates are modelled as new rows
//! (verification history) or nullable anchor fields filled in after the
//! ledger confirms.

use chrono::{DateTime, Utc};
use proptrust_common::types::{DocumentType, Fingerprint, RiskLevel};
use serde::{Deserialize, Serialize};

use super::risk::RiskFactor;
use super::stages::{ClassLabel, EntityBundle};

/// Durable identity for a parcel as observed by this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    pub document_type: DocumentType,
    pub created_at: DateTime<Utc>,
    /// Denormalized last-seen values, for search only.
    pub owner_name: Option<String>,
    pub survey_number: Option<String>,
}

/// Canonical output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub verification_id: String,
    pub property_id: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub classification_label: ClassLabel,
    pub classification_confidence: f64,
    pub fingerprint: Fingerprint,
    /// Opaque ledger handle; None when anchoring was deferred or failed.
    pub anchor_reference: Option<String>,
    pub anchor_block_height: Option<i64>,
    pub anchor_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One-to-one companion of a VerificationRecord holding the extracted
/// entity set, pipeline warnings, and raw OCR statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationDetail {
    pub verification_id: String,
    pub entities: EntityBundle,
    /// Cleaned text, truncated to a bounded preview length.
    pub cleaned_text_preview: String,
    pub pages_processed: u32,
    pub chars_original: usize,
    pub chars_cleaned: usize,
    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome status of a tamper check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TamperStatus {
    Verified,
    Tampered,
    NotFound,
    Error,
}

impl TamperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TamperStatus::Verified => "VERIFIED",
            TamperStatus::Tampered => "TAMPERED",
            TamperStatus::NotFound => "NOT_FOUND",
            TamperStatus::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> TamperStatus {
        match s {
            "VERIFIED" => TamperStatus::Verified,
            "TAMPERED" => TamperStatus::Tampered,
            "NOT_FOUND" => TamperStatus::NotFound,
            _ => TamperStatus::Error,
        }
    }
}

impl std::fmt::Display for TamperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one re-verification against the anchored fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperCheck {
    pub tamper_check_id: String,
    pub property_id: String,
    pub anchored_fingerprint: Option<Fingerprint>,
    pub recomputed_fingerprint: Option<Fingerprint>,
    pub hash_matched: bool,
    pub risk_score_delta: i32,
    pub status: TamperStatus,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Engine-level operations recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOperation {
    Verify,
    TamperCheck,
    Delete,
    LedgerAnchor,
    LedgerFailure,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Verify => "VERIFY",
            AuditOperation::TamperCheck => "TAMPER_CHECK",
            AuditOperation::Delete => "DELETE",
            AuditOperation::LedgerAnchor => "LEDGER_ANCHOR",
            AuditOperation::LedgerFailure => "LEDGER_FAILURE",
        }
    }
}

impl std::fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }
}

/// Append-only audit trail row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub operation: AuditOperation,
    pub property_id: Option<String>,
    pub status: AuditStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
