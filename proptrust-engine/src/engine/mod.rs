//! The verification engine
//!
//! All external capabilities (OCR, translator, classifier, NER model,
//! ledger, clock, id generator) are injected through the constructor; there
//! is no module-level adapter state. The orchestrator (`verify`) and the
//! tamper checker (`check_tamper`) share one pipeline implementation.

mod orchestrator;
mod tamper;

pub use orchestrator::{VerificationOutcome, VerifyRequest};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use proptrust_common::clock::{Clock, SystemClock};
use proptrust_common::config::{EngineConfig, LedgerBackend};
use proptrust_common::ids::{IdGenerator, UuidIdGenerator};
use proptrust_common::{Error, Result};
use sqlx::SqlitePool;

use crate::db;
use crate::extractors::{
    CachingTranslator, DocumentClassifier, HttpClassifierClient, HttpNerClient, HttpOcrClient,
    HttpTranslatorClient, KeywordClassifier, NerModel, NoopNerModel, PassthroughTranslator,
    TextExtractor, Translator,
};
use crate::ledger::{Ledger, LocalLedger, RemoteLedger};
use crate::models::{AuditOperation, AuditStatus};
use crate::services::EntityExtractor;

/// The injected capability set.
pub struct EngineAdapters {
    pub extractor: Arc<dyn TextExtractor>,
    pub translator: Arc<dyn Translator>,
    pub classifier: Arc<dyn DocumentClassifier>,
    pub ner: Arc<dyn NerModel>,
    pub ledger: Arc<dyn Ledger>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
}

pub struct VerificationEngine {
    pub(crate) db: SqlitePool,
    pub(crate) config: EngineConfig,
    pub(crate) extractor: Arc<dyn TextExtractor>,
    pub(crate) translator: Arc<dyn Translator>,
    pub(crate) classifier: Arc<dyn DocumentClassifier>,
    pub(crate) ner: Arc<dyn NerModel>,
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) entity_extractor: EntityExtractor,
}

impl VerificationEngine {
    pub fn new(db: SqlitePool, config: EngineConfig, adapters: EngineAdapters) -> Self {
        let entity_extractor = EntityExtractor::new(config.classifier_confidence_floor);
        Self {
            db,
            extractor: adapters.extractor,
            translator: Arc::new(CachingTranslator::new(
                adapters.translator,
                config.translation_cache_capacity,
            )),
            classifier: adapters.classifier,
            ner: adapters.ner,
            ledger: adapters.ledger,
            clock: adapters.clock,
            ids: adapters.ids,
            entity_extractor,
            config,
        }
    }

    /// Wire the production adapter set from configuration: HTTP clients for
    /// every configured endpoint, offline implementations otherwise. OCR has
    /// no offline implementation, so its endpoint is required.
    pub fn from_config(db: SqlitePool, config: EngineConfig) -> Result<Self> {
        let extractor: Arc<dyn TextExtractor> = match &config.ocr_endpoint {
            Some(endpoint) => Arc::new(HttpOcrClient::new(
                endpoint.clone(),
                config.extraction_timeout,
            )?),
            None => {
                return Err(Error::Config(
                    "PROPTRUST_OCR_ENDPOINT is required; the engine has no built-in OCR".into(),
                ))
            }
        };

        let translator: Arc<dyn Translator> = match &config.translator_endpoint {
            Some(endpoint) => Arc::new(HttpTranslatorClient::new(
                endpoint.clone(),
                config.translation_timeout,
            )?),
            None => Arc::new(PassthroughTranslator),
        };

        let classifier: Arc<dyn DocumentClassifier> = match &config.classifier_endpoint {
            Some(endpoint) => Arc::new(HttpClassifierClient::new(
                endpoint.clone(),
                config.classifier_timeout,
            )?),
            None => Arc::new(KeywordClassifier),
        };

        // Dedicated NER endpoint when configured; falls back to the
        // classifier host, which is where single-host deployments serve
        // both models.
        let ner_endpoint = config
            .ner_endpoint
            .as_ref()
            .or(config.classifier_endpoint.as_ref());
        let ner: Arc<dyn NerModel> = match ner_endpoint {
            Some(endpoint) => Arc::new(HttpNerClient::new(
                endpoint.clone(),
                config.classifier_timeout,
            )?),
            None => Arc::new(NoopNerModel),
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger: Arc<dyn Ledger> = match &config.ledger_backend {
            LedgerBackend::Local => Arc::new(LocalLedger::new(
                db.clone(),
                clock.clone(),
                "proptrust-engine".to_string(),
            )),
            LedgerBackend::Remote { endpoint, identity } => Arc::new(
                RemoteLedger::new(endpoint.clone(), identity.clone(), config.ledger_timeout)
                    .map_err(|e| Error::Config(e.to_string()))?,
            ),
        };

        Ok(Self::new(
            db,
            config,
            EngineAdapters {
                extractor,
                translator,
                classifier,
                ner,
                ledger,
                clock,
                ids: Arc::new(UuidIdGenerator),
            },
        ))
    }

    pub fn ledger(&self) -> Arc<dyn Ledger> {
        self.ledger.clone()
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Cascade-delete a property and everything derived from it, appending
    /// an audit entry. Returns false when the property does not exist. The
    /// ledger is deliberately untouched.
    pub async fn delete_property(&self, property_id: &str) -> Result<bool> {
        let deleted = db::properties::delete_property(&self.db, property_id).await?;
        if deleted {
            self.audit(
                AuditOperation::Delete,
                Some(property_id),
                AuditStatus::Success,
                "property and derived records deleted; ledger entries retained",
            )
            .await;
            tracing::info!(property_id = %property_id, "property deleted");
        }
        Ok(deleted)
    }

    /// Append an audit entry; audit failures are logged, never propagated,
    /// so they cannot mask the operation's own outcome.
    pub(crate) async fn audit(
        &self,
        operation: AuditOperation,
        property_id: Option<&str>,
        status: AuditStatus,
        message: &str,
    ) {
        if let Err(e) = db::audit::append(
            &self.db,
            operation,
            property_id,
            status,
            message,
            self.clock.now(),
        )
        .await
        {
            tracing::warn!(error = %e, operation = %operation, "audit append failed");
        }
    }
}
