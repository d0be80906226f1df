//! Entity-recognition model adapter
//!
//! The trained NER model is an external capability; it supplies additional
//! candidate spans that the rule layer did not find. The resolution rules in
//! `services::entity_extractor` decide whether a span is used.

use std::time::Duration;

use async_trait::async_trait;
use proptrust_common::error::{Error, Result, Stage};
use serde::{Deserialize, Serialize};

use crate::models::EntitySpan;

/// Supplies model-predicted entity spans for cleaned text.
#[async_trait]
pub trait NerModel: Send + Sync {
    async fn spans(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Model-less default: the rule layer stands alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNerModel;

#[async_trait]
impl NerModel for NoopNerModel {
    async fn spans(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NerResponse {
    spans: Vec<EntitySpan>,
}

/// HTTP client for a remote NER model service.
pub struct HttpNerClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpNerClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::EntityExtraction,
                message: e.to_string(),
            })?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl NerModel for HttpNerClient {
    async fn spans(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let response = self
            .http_client
            .post(format!("{}/spans", self.endpoint))
            .json(&NerRequest { text })
            .send()
            .await
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::EntityExtraction,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::ExternalUnavailable {
                stage: Stage::EntityExtraction,
                message: format!("NER service returned {}", response.status()),
            });
        }

        let parsed: NerResponse = response.json().await.map_err(|e| Error::ExternalUnavailable {
            stage: Stage::EntityExtraction,
            message: format!("NER response parse failed: {e}"),
        })?;
        Ok(parsed.spans)
    }
}
