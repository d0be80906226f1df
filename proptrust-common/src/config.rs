//! Engine configuration
//!
//! Configuration is environment-driven. Every knob has a compiled default so
//! the engine starts with no environment at all; invalid values are
//! configuration errors rather than silent fallbacks.

use std::time::Duration;

use crate::{Error, Result};

/// Selected ledger backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    /// SQLite-backed simulated ledger, deterministic and offline.
    Local,
    /// Remote chain client; requires `PROPTRUST_LEDGER_ENDPOINT`.
    Remote { endpoint: String, identity: String },
}

/// Engine configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-stage deadlines for the blocking external calls.
    pub extraction_timeout: Duration,
    pub translation_timeout: Duration,
    pub classifier_timeout: Duration,
    pub ledger_timeout: Duration,

    /// Classifier confidence below this floor collapses to UNKNOWN and is
    /// excluded from the canonical projection.
    pub classifier_confidence_floor: f64,
    /// Cleaned-text length below this floor fires the data_quality_low factor.
    pub data_quality_chars_floor: usize,
    /// Capacity of the content-hash translation cache.
    pub translation_cache_capacity: usize,

    pub ledger_backend: LedgerBackend,

    /// Endpoints for the external capability adapters; None selects the
    /// built-in offline implementation where one exists. The NER endpoint
    /// falls back to the classifier endpoint when unset, since smaller
    /// deployments serve both models from one host.
    pub ocr_endpoint: Option<String>,
    pub translator_endpoint: Option<String>,
    pub classifier_endpoint: Option<String>,
    pub ner_endpoint: Option<String>,

    pub db_path: String,
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_millis(60_000),
            translation_timeout: Duration::from_millis(30_000),
            classifier_timeout: Duration::from_millis(20_000),
            ledger_timeout: Duration::from_millis(30_000),
            classifier_confidence_floor: 0.5,
            data_quality_chars_floor: 200,
            translation_cache_capacity: 1024,
            ledger_backend: LedgerBackend::Local,
            ocr_endpoint: None,
            translator_endpoint: None,
            classifier_endpoint: None,
            ner_endpoint: None,
            db_path: "proptrust.db".to_string(),
            port: 5730,
        }
    }
}

impl EngineConfig {
    /// Resolve configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let ledger_backend = match env_string("PROPTRUST_LEDGER_BACKEND") {
            None => LedgerBackend::Local,
            Some(v) if v.eq_ignore_ascii_case("local") => LedgerBackend::Local,
            Some(v) if v.eq_ignore_ascii_case("remote") => {
                let endpoint = env_string("PROPTRUST_LEDGER_ENDPOINT").ok_or_else(|| {
                    Error::Config(
                        "PROPTRUST_LEDGER_BACKEND=remote requires PROPTRUST_LEDGER_ENDPOINT".into(),
                    )
                })?;
                let identity = env_string("PROPTRUST_LEDGER_IDENTITY")
                    .unwrap_or_else(|| "proptrust-engine".to_string());
                LedgerBackend::Remote { endpoint, identity }
            }
            Some(v) => {
                return Err(Error::Config(format!(
                    "PROPTRUST_LEDGER_BACKEND must be 'local' or 'remote', got '{v}'"
                )))
            }
        };

        Ok(EngineConfig {
            extraction_timeout: env_duration_ms(
                "PROPTRUST_EXTRACTION_TIMEOUT_MS",
                defaults.extraction_timeout,
            )?,
            translation_timeout: env_duration_ms(
                "PROPTRUST_TRANSLATION_TIMEOUT_MS",
                defaults.translation_timeout,
            )?,
            classifier_timeout: env_duration_ms(
                "PROPTRUST_CLASSIFIER_TIMEOUT_MS",
                defaults.classifier_timeout,
            )?,
            ledger_timeout: env_duration_ms("PROPTRUST_LEDGER_TIMEOUT_MS", defaults.ledger_timeout)?,
            classifier_confidence_floor: env_parse(
                "PROPTRUST_CLASSIFIER_CONFIDENCE_FLOOR",
                defaults.classifier_confidence_floor,
            )?,
            data_quality_chars_floor: env_parse(
                "PROPTRUST_RISK_DATA_QUALITY_CHARS_FLOOR",
                defaults.data_quality_chars_floor,
            )?,
            translation_cache_capacity: env_parse(
                "PROPTRUST_TRANSLATION_CACHE_CAPACITY",
                defaults.translation_cache_capacity,
            )?,
            ledger_backend,
            ocr_endpoint: env_string("PROPTRUST_OCR_ENDPOINT"),
            translator_endpoint: env_string("PROPTRUST_TRANSLATOR_ENDPOINT"),
            classifier_endpoint: env_string("PROPTRUST_CLASSIFIER_ENDPOINT"),
            ner_endpoint: env_string("PROPTRUST_NER_ENDPOINT"),
            db_path: env_string("PROPTRUST_DB_PATH").unwrap_or(defaults.db_path),
            port: env_parse("PROPTRUST_PORT", defaults.port)?,
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env_string(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} has invalid value '{raw}'"))),
    }
}

fn env_duration_ms(name: &str, default: Duration) -> Result<Duration> {
    let ms: u64 = env_parse(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.extraction_timeout, Duration::from_secs(60));
        assert_eq!(config.translation_timeout, Duration::from_secs(30));
        assert_eq!(config.classifier_timeout, Duration::from_secs(20));
        assert_eq!(config.ledger_timeout, Duration::from_secs(30));
        assert_eq!(config.classifier_confidence_floor, 0.5);
        assert_eq!(config.data_quality_chars_floor, 200);
        assert_eq!(config.translation_cache_capacity, 1024);
        assert_eq!(config.ledger_backend, LedgerBackend::Local);
    }
}
