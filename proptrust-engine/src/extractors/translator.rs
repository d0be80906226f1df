//! Translation capability adapter
//!
//! Kannada (and other regional-language) text goes through an external
//! machine-translation service. Two guarantees matter to the pipeline:
//! repeat calls for the same cleaned text return identical output (content
//! hash cache), and translation failure is never fatal (the orchestrator
//! falls back to the original text with a warning).

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use proptrust_common::error::{Error, Result, Stage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Translates cleaned text to English.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// No-op translator for English documents and offline use.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

/// HTTP client for a remote translation service.
pub struct HttpTranslatorClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpTranslatorClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Translation,
                message: e.to_string(),
            })?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslatorClient {
    async fn translate(&self, text: &str) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/translate", self.endpoint))
            .json(&TranslateRequest { text, target: "en" })
            .send()
            .await
            .map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Translation,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::ExternalUnavailable {
                stage: Stage::Translation,
                message: format!("translator returned {}", response.status()),
            });
        }

        let parsed: TranslateResponse =
            response.json().await.map_err(|e| Error::ExternalUnavailable {
                stage: Stage::Translation,
                message: format!("translator response parse failed: {e}"),
            })?;
        Ok(parsed.translated_text)
    }
}

/// Bounded LRU cache over any translator, keyed by the SHA-256 of the
/// cleaned input text. Repeat calls for identical text return identical
/// output without touching the wire.
pub struct CachingTranslator {
    inner: Arc<dyn Translator>,
    cache: Mutex<LruCache<[u8; 32], String>>,
}

impl CachingTranslator {
    pub fn new(inner: Arc<dyn Translator>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl Translator for CachingTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let key: [u8; 32] = Sha256::digest(text.as_bytes()).into();

        {
            let mut cache = self.cache.lock().await;
            if let Some(hit) = cache.get(&key) {
                tracing::debug!("translation cache hit");
                return Ok(hit.clone());
            }
        }

        let translated = self.inner.translate(text).await?;

        let mut cache = self.cache.lock().await;
        cache.put(key, translated.clone());
        Ok(translated)
    }
}
