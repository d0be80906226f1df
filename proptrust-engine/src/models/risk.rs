//! Risk assessment output types

use proptrust_common::types::RiskLevel;
use serde::{Deserialize, Serialize};

/// One fired risk factor with its fixed weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Stable factor code, e.g. "loan_present".
    pub code: String,
    pub weight: u8,
    pub description: String,
}

impl RiskFactor {
    pub fn new(code: &str, weight: u8, description: impl Into<String>) -> RiskFactor {
        RiskFactor {
            code: code.to_string(),
            weight,
            description: description.into(),
        }
    }
}

/// Output of the rule-based risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Additive score clamped to [0, 100].
    pub score: u8,
    pub level: RiskLevel,
    /// Factors in table order; deterministic for a given input.
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn factor_codes(&self) -> Vec<String> {
        self.factors.iter().map(|f| f.code.clone()).collect()
    }

    pub fn has_factor(&self, code: &str) -> bool {
        self.factors.iter().any(|f| f.code == code)
    }
}
