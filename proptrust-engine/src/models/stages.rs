//! Per-stage pipeline output types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Image,
    Pdf,
}

impl DocumentFormat {
    /// Sniff the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<DocumentFormat> {
        if bytes.starts_with(b"%PDF") {
            Some(DocumentFormat::Pdf)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF])
            || bytes.starts_with(&[0x89, b'P', b'N', b'G'])
            || bytes.starts_with(b"II*\0")
            || bytes.starts_with(b"MM\0*")
        {
            Some(DocumentFormat::Image)
        } else {
            None
        }
    }
}

/// Output of the text extraction adapter: raw page text plus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Per-page raw text, in page order.
    pub pages: Vec<String>,
    pub pages_processed: u32,
    /// Character count of the raw extracted text.
    pub chars_original: usize,
    /// ISO 639-1 hint from the provider ("en", "kn"), when reported.
    pub language_hint: Option<String>,
}

impl ExtractionOutput {
    /// Join pages into the single raw text the normalizer consumes.
    pub fn joined_text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Deterministically cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub chars_cleaned: usize,
}

/// Result of the (optional) translation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// English text the downstream stages consume. On failure this is the
    /// original cleaned text.
    pub text: String,
    /// Whether the translator actually ran and succeeded.
    pub translated: bool,
    /// Warning annotation for degraded translation, e.g. `translation_unavailable`.
    pub warning: Option<String>,
}

impl TranslationOutcome {
    pub fn passthrough(text: String) -> TranslationOutcome {
        TranslationOutcome {
            text,
            translated: false,
            warning: None,
        }
    }
}

/// A registered loan or mortgage entry against the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanEntry {
    /// Amount in whole rupees.
    pub amount: i64,
    pub bank: Option<String>,
    /// Surrounding text the amount was found in, cleaned for readability.
    pub context: String,
}

/// A mutation-register reference found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEntry {
    /// e.g. "MR 4/2003-2004"
    pub record_number: String,
    pub description: String,
    /// True when the surrounding text marks the mutation as not yet effected.
    pub pending: bool,
}

/// The fixed entity schema extracted from a document. A field that could not
/// be extracted is absent, never an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityBundle {
    pub owner: Option<String>,
    pub survey_number: Option<String>,
    pub hissa_number: Option<String>,
    pub village: Option<String>,
    pub taluk: Option<String>,
    pub district: Option<String>,
    pub extent_acres: Option<i64>,
    pub extent_guntas: Option<i64>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub digitally_signed_date: Option<NaiveDate>,
    /// Ordered by first appearance in the source text.
    pub loans: Vec<LoanEntry>,
    pub mutations: Vec<MutationEntry>,
    pub case_numbers: Vec<String>,
    /// Raw DD/MM/YYYY date strings, ordered by first appearance.
    pub dates: Vec<String>,
}

impl EntityBundle {
    pub fn has_pending_mutation(&self) -> bool {
        self.mutations.iter().any(|m| m.pending)
    }
}

/// A candidate span produced by the entity-recognition model adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Schema field the span is a candidate for ("owner", "survey_number", ...).
    pub field: String,
    pub value: String,
    /// Model confidence in [0, 1].
    pub confidence: f64,
    /// Byte offset of the span in the source text, for appearance ordering.
    pub offset: usize,
}

/// Document classification labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassLabel {
    ClearTitle,
    LoanDetected,
    MutationPending,
    CourtCase,
    ForgerySuspected,
    MultipleIssues,
    Unknown,
}

impl ClassLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLabel::ClearTitle => "CLEAR_TITLE",
            ClassLabel::LoanDetected => "LOAN_DETECTED",
            ClassLabel::MutationPending => "MUTATION_PENDING",
            ClassLabel::CourtCase => "COURT_CASE",
            ClassLabel::ForgerySuspected => "FORGERY_SUSPECTED",
            ClassLabel::MultipleIssues => "MULTIPLE_ISSUES",
            ClassLabel::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> ClassLabel {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLEAR_TITLE" => ClassLabel::ClearTitle,
            "LOAN_DETECTED" => ClassLabel::LoanDetected,
            "MUTATION_PENDING" => ClassLabel::MutationPending,
            "COURT_CASE" => ClassLabel::CourtCase,
            "FORGERY_SUSPECTED" => ClassLabel::ForgerySuspected,
            "MULTIPLE_ISSUES" => ClassLabel::MultipleIssues,
            _ => ClassLabel::Unknown,
        }
    }

    /// Labels that contribute the classifier_high_risk factor.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, ClassLabel::CourtCase | ClassLabel::ForgerySuspected)
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier adapter output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: ClassLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn unknown() -> Classification {
        Classification {
            label: ClassLabel::Unknown,
            confidence: 0.0,
        }
    }

    /// Collapse to UNKNOWN when confidence is below the configured floor.
    /// Keeps low-confidence model drift out of the canonical projection.
    pub fn floored(self, floor: f64) -> Classification {
        if self.confidence < floor {
            Classification {
                label: ClassLabel::Unknown,
                confidence: self.confidence,
            }
        } else {
            self
        }
    }
}
