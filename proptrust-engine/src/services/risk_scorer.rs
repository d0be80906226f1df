//! Rule-based risk scoring
//!
//! Pure, auditable function from the extracted detail and classification to
//! a score, level, fired factors and recommendations. No model involvement;
//! every point on the score traces to a named factor with a fixed weight.

use chrono::NaiveDate;
use proptrust_common::types::RiskLevel;

use crate::models::{ClassLabel, Classification, EntityBundle, RiskAssessment, RiskFactor};

pub const WEIGHT_LOAN_PRESENT: u8 = 30;
pub const WEIGHT_LEGAL_CASE: u8 = 15;
pub const WEIGHT_MUTATION_PENDING: u8 = 20;
pub const WEIGHT_OWNER_MISSING: u8 = 15;
pub const WEIGHT_SURVEY_MISSING: u8 = 15;
pub const WEIGHT_DATA_QUALITY_LOW: u8 = 10;
pub const WEIGHT_VALIDITY_EXPIRED: u8 = 10;
pub const WEIGHT_CLASSIFIER_HIGH_RISK: u8 = 20;

/// Inputs to one scoring run. `classification` is the post-floor value; a
/// below-floor label has already collapsed to UNKNOWN before scoring.
#[derive(Debug, Clone)]
pub struct RiskInput<'a> {
    pub entities: &'a EntityBundle,
    pub classification: &'a Classification,
    pub chars_cleaned: usize,
    pub chars_floor: usize,
    pub today: NaiveDate,
}

/// Score a verification. Additive over independent factors, clamped to 100.
pub fn score(input: &RiskInput<'_>) -> RiskAssessment {
    let mut factors: Vec<RiskFactor> = Vec::new();
    let entities = input.entities;

    if !entities.loans.is_empty() {
        let first = &entities.loans[0];
        let description = match &first.bank {
            Some(bank) => format!("Active loan of Rs. {} from {}", first.amount, bank),
            None => format!("Active loan of Rs. {}", first.amount),
        };
        factors.push(RiskFactor::new("loan_present", WEIGHT_LOAN_PRESENT, description));
    }

    if !entities.case_numbers.is_empty() {
        factors.push(RiskFactor::new(
            "legal_case",
            WEIGHT_LEGAL_CASE,
            format!("Legal case found: {}", entities.case_numbers.join(", ")),
        ));
    }

    if input.classification.label == ClassLabel::MutationPending || entities.has_pending_mutation()
    {
        factors.push(RiskFactor::new(
            "mutation_pending",
            WEIGHT_MUTATION_PENDING,
            "Mutation has not been completed in the revenue records",
        ));
    }

    if entities.owner.is_none() {
        factors.push(RiskFactor::new(
            "owner_missing",
            WEIGHT_OWNER_MISSING,
            "No owner name could be extracted",
        ));
    }

    if entities.survey_number.is_none() {
        factors.push(RiskFactor::new(
            "survey_missing",
            WEIGHT_SURVEY_MISSING,
            "No survey number could be extracted",
        ));
    }

    if input.chars_cleaned < input.chars_floor {
        factors.push(RiskFactor::new(
            "data_quality_low",
            WEIGHT_DATA_QUALITY_LOW,
            format!(
                "Cleaned text is only {} characters (floor {})",
                input.chars_cleaned, input.chars_floor
            ),
        ));
    }

    if let Some(valid_to) = entities.valid_to {
        if valid_to < input.today {
            factors.push(RiskFactor::new(
                "validity_expired",
                WEIGHT_VALIDITY_EXPIRED,
                format!("Record validity ended {}", valid_to.format("%d/%m/%Y")),
            ));
        }
    }

    if input.classification.label.is_high_risk() {
        factors.push(RiskFactor::new(
            "classifier_high_risk",
            WEIGHT_CLASSIFIER_HIGH_RISK,
            format!("Document classified as {}", input.classification.label),
        ));
    }

    let total: u32 = factors.iter().map(|f| f.weight as u32).sum();
    let score = total.min(100) as u8;
    let level = RiskLevel::from_score(score);
    let recommendations = recommendations(level, &factors);

    RiskAssessment {
        score,
        level,
        factors,
        recommendations,
    }
}

/// Static factor-to-recommendation mapping; output order is level preamble
/// first, then per-factor texts in factor order.
fn recommendations(level: RiskLevel, factors: &[RiskFactor]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    match level {
        RiskLevel::High => {
            out.push("Do not proceed without thorough legal verification".to_string());
            out.push("Engage an experienced property lawyer".to_string());
        }
        RiskLevel::Medium => {
            out.push("Proceed with caution".to_string());
            out.push("Obtain a legal opinion before finalizing the transaction".to_string());
        }
        RiskLevel::Low => {
            out.push("Low risk: proceed with standard due diligence".to_string());
        }
    }

    for factor in factors {
        let texts: &[&str] = match factor.code.as_str() {
            "loan_present" => &[
                "Obtain a No Objection Certificate from all lenders",
                "Verify loan status and outstanding amount",
            ],
            "legal_case" => &[
                "Obtain a certified copy of the court case details",
                "Verify the current status of the litigation",
            ],
            "mutation_pending" => &[
                "Complete the mutation process in the revenue records",
                "Obtain an updated khata in the seller's name",
            ],
            "owner_missing" => &["Verify ownership from the original revenue records"],
            "survey_missing" => &["Verify the survey number from the revenue records"],
            "data_quality_low" => &["Obtain a clearer copy of the document and re-verify"],
            "validity_expired" => &["Obtain a current copy of the record"],
            "classifier_high_risk" => &["Conduct forensic verification of the document"],
            _ => &[],
        };
        out.extend(texts.iter().map(|t| t.to_string()));
    }

    out
}
