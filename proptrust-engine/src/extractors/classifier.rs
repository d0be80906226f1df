//! Document classification adapter
//!
//! Input is cleaned text; output is a label with a confidence. The engine
//! collapses below-floor confidence to UNKNOWN before the label can reach
//! the risk scorer or the canonical projection, so model drift below the
//! floor never moves the fingerprint.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use proptrust_common::error::{Error, Result, Stage};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{ClassLabel, Classification};

/// Assigns a document-type label with confidence.
#[async_trait]
pub trait DocumentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
    confidence: f64,
}

/// HTTP client for a remote classifier model service.
pub struct HttpClassifierClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifierClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Classification,
                message: e.to_string(),
            })?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl DocumentClassifier for HttpClassifierClient {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let response = self
            .http_client
            .post(format!("{}/classify", self.endpoint))
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Classification,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::ExternalUnavailable {
                stage: Stage::Classification,
                message: format!("classifier returned {}", response.status()),
            });
        }

        let parsed: ClassifyResponse =
            response.json().await.map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Classification,
                message: format!("classifier response parse failed: {e}"),
            })?;

        Ok(Classification {
            label: ClassLabel::parse(&parsed.label),
            confidence: parsed.confidence.clamp(0.0, 1.0),
        })
    }
}

static LOAN_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(loan|mortgage|encumbrance|charge|hypothecation)\b|₹|\bRs\.?\s*\d").unwrap()
});
static CASE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(court|civil\s+suit|criminal\s+case|litigation)\b|\bC\.?S\.?\s*No\b").unwrap()
});
static MUTATION_PENDING_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mutation[^.\n]{0,60}(pending|not\s+(?:yet\s+)?effected)").unwrap());
static FORGERY_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(forged|forgery|fabricated|counterfeit)\b").unwrap());
static SURVEY_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Survey\s*(?:No|Number)|\bSy\.?\s*No").unwrap());

/// Deterministic keyword classifier, usable offline and in tests.
///
/// Scores each label from keyword evidence and returns the best one; scoring
/// mirrors the rule layer the trained model was bootstrapped from.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    fn classify_text(text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::unknown();
        }

        let loan = LOAN_HINT.is_match(text);
        let case = CASE_HINT.is_match(text);
        let mutation_pending = MUTATION_PENDING_HINT.is_match(text);
        let forgery = FORGERY_HINT.is_match(text);
        let survey = SURVEY_HINT.is_match(text);

        // Candidate scores; the highest wins, ties resolve in listing order.
        let mut scored: Vec<(ClassLabel, f64)> = Vec::new();
        if forgery {
            scored.push((ClassLabel::ForgerySuspected, 0.95));
        }
        if loan {
            scored.push((ClassLabel::LoanDetected, 0.9));
        }
        if case {
            scored.push((ClassLabel::CourtCase, 0.85));
        }
        if [loan, case, mutation_pending].iter().filter(|b| **b).count() >= 2 {
            scored.push((ClassLabel::MultipleIssues, 0.8));
        }
        if mutation_pending {
            scored.push((ClassLabel::MutationPending, 0.8));
        }
        if scored.is_empty() && survey {
            scored.push((ClassLabel::ClearTitle, 0.85));
        }

        scored
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, confidence)| Classification { label, confidence })
            .unwrap_or_else(Classification::unknown)
    }
}

#[async_trait]
impl DocumentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        Ok(Self::classify_text(text))
    }
}
