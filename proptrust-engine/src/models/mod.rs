//! Typed records flowing between pipeline stages and into persistence.
//!
//! Each stage produces an explicit, immutable record type; the canonical
//! projection used for fingerprinting is derived from these types.

mod records;
mod risk;
mod stages;

pub use records::{
    AuditEntry, AuditOperation, AuditStatus, Property, TamperCheck, TamperStatus,
    VerificationDetail, VerificationRecord,
};
pub use risk::{RiskAssessment, RiskFactor};
pub use stages::{
    ClassLabel, Classification, DocumentFormat, EntityBundle, EntitySpan, ExtractionOutput,
    LoanEntry, MutationEntry, NormalizedText, TranslationOutcome,
};
