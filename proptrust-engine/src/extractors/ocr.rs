//! OCR capability adapter
//!
//! Wraps the external OCR provider behind the `TextExtractor` trait. The
//! engine treats OCR output as noisy; fingerprint stability is the
//! normalizer's job, not the provider's.

use async_trait::async_trait;
use proptrust_common::error::{Error, Result, Stage};
use serde::Deserialize;
use std::time::Duration;

use crate::models::{DocumentFormat, ExtractionOutput};

/// Produces raw page text plus per-page metadata from document bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<ExtractionOutput>;
}

/// Response shape of the OCR service.
#[derive(Debug, Deserialize)]
struct OcrResponse {
    pages: Vec<String>,
    #[serde(default)]
    language: Option<String>,
}

/// HTTP client for a remote OCR service.
///
/// POSTs the raw document bytes with a format hint and maps the response
/// onto [`ExtractionOutput`]. Empty provider output is success with empty
/// text, not an error. A provider-side rejection of the document (4xx) is
/// `BadInput`; transport failures and 5xx are `ExternalUnavailable`.
pub struct HttpOcrClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpOcrClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Extraction,
                message: e.to_string(),
            })?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl TextExtractor for HttpOcrClient {
    async fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<ExtractionOutput> {
        let format_hint = match format {
            DocumentFormat::Image => "image",
            DocumentFormat::Pdf => "pdf",
        };

        let response = self
            .http_client
            .post(format!("{}/extract", self.endpoint))
            .query(&[("format", format_hint)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Extraction,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            // The provider understood the request and rejected the document
            // itself (unsupported format, undecodable bytes).
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BadInput(format!(
                "OCR provider rejected the document ({status}): {body}"
            )));
        }
        if !status.is_success() {
            return Err(Error::ExternalUnavailable {
                stage: Stage::Extraction,
                message: format!("OCR service returned {status}"),
            });
        }

        let parsed: OcrResponse = response.json().await.map_err(|e| Error::ExternalUnavailable {
            stage: Stage::Extraction,
            message: format!("OCR response parse failed: {e}"),
        })?;

        let chars_original = parsed.pages.iter().map(|p| p.chars().count()).sum();
        let pages_processed = parsed.pages.len() as u32;
        tracing::debug!(
            pages = pages_processed,
            chars = chars_original,
            "OCR extraction complete"
        );

        Ok(ExtractionOutput {
            pages: parsed.pages,
            pages_processed,
            chars_original,
            language_hint: parsed.language,
        })
    }
}
