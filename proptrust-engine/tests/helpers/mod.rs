//! Shared test fixtures: fake capability adapters and engine construction.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use proptrust_common::clock::SystemClock;
use proptrust_common::config::EngineConfig;
use proptrust_common::error::{Error, Result, Stage};
use proptrust_common::ids::SequentialIdGenerator;
use proptrust_engine::db;
use proptrust_engine::engine::{EngineAdapters, VerificationEngine};
use proptrust_engine::extractors::{
    DocumentClassifier, KeywordClassifier, NoopNerModel, PassthroughTranslator, TextExtractor,
    Translator,
};
use proptrust_engine::ledger::{
    Ledger, LedgerEntry, LedgerError, LedgerReceipt, LedgerResult, LedgerStatus, LocalLedger,
};
use proptrust_engine::models::{Classification, DocumentFormat, ExtractionOutput};
use proptrust_common::types::Fingerprint;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// OCR fake that returns the uploaded bytes as UTF-8 text, one page.
/// Deterministic by construction, which is what fingerprint tests need.
pub struct EchoOcr {
    pub language: Option<String>,
}

impl EchoOcr {
    pub fn english() -> Self {
        Self {
            language: Some("en".to_string()),
        }
    }

    pub fn kannada() -> Self {
        Self {
            language: Some("kn".to_string()),
        }
    }
}

#[async_trait]
impl TextExtractor for EchoOcr {
    async fn extract(&self, bytes: &[u8], _format: DocumentFormat) -> Result<ExtractionOutput> {
        let text = String::from_utf8_lossy(bytes).to_string();
        let chars_original = text.chars().count();
        Ok(ExtractionOutput {
            pages: vec![text],
            pages_processed: 1,
            chars_original,
            language_hint: self.language.clone(),
        })
    }
}

/// OCR fake that always fails, for unavailability tests.
pub struct FailingOcr;

#[async_trait]
impl TextExtractor for FailingOcr {
    async fn extract(&self, _bytes: &[u8], _format: DocumentFormat) -> Result<ExtractionOutput> {
        Err(Error::ExternalUnavailable {
            stage: Stage::Extraction,
            message: "OCR provider offline".into(),
        })
    }
}

/// Translator fake that always fails, for degraded-pipeline tests.
pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str) -> Result<String> {
        Err(Error::ExternalUnavailable {
            stage: Stage::Translation,
            message: "translator offline".into(),
        })
    }
}

/// Classifier fake returning a fixed classification.
pub struct FixedClassifier(pub Classification);

#[async_trait]
impl DocumentClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<Classification> {
        Ok(self.0.clone())
    }
}

/// Ledger fake that refuses every operation, for anchoring-failure tests.
pub struct OfflineLedger;

#[async_trait]
impl Ledger for OfflineLedger {
    async fn put(
        &self,
        _property_id: &str,
        _fingerprint: &Fingerprint,
        _risk_score: u8,
    ) -> LedgerResult<LedgerReceipt> {
        Err(LedgerError::Unavailable("ledger offline".into()))
    }

    async fn get(&self, _property_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        Err(LedgerError::Unavailable("ledger offline".into()))
    }

    async fn history(&self, _property_id: &str) -> LedgerResult<Vec<Fingerprint>> {
        Err(LedgerError::Unavailable("ledger offline".into()))
    }

    async fn status(&self) -> LedgerStatus {
        LedgerStatus {
            connected: false,
            backend: "offline".to_string(),
            latest_block_height: None,
        }
    }
}

/// Build an engine over an in-memory database with the given adapters.
pub async fn build_engine(
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn Translator>,
    classifier: Arc<dyn DocumentClassifier>,
    ledger: Option<Arc<dyn Ledger>>,
) -> Arc<VerificationEngine> {
    // A single connection keeps the in-memory database visible to every
    // query; separate pooled connections would each get their own.
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db::init_tables(&pool).await.expect("schema creation");

    let clock = Arc::new(SystemClock);
    let ledger: Arc<dyn Ledger> = ledger.unwrap_or_else(|| {
        Arc::new(LocalLedger::new(
            pool.clone(),
            clock.clone(),
            "test-verifier".to_string(),
        ))
    });

    Arc::new(VerificationEngine::new(
        pool,
        EngineConfig::default(),
        EngineAdapters {
            extractor,
            translator,
            classifier,
            ner: Arc::new(NoopNerModel),
            ledger,
            clock,
            ids: Arc::new(SequentialIdGenerator::new()),
        },
    ))
}

/// Default test engine: echo OCR (English), passthrough translation, keyword
/// classification, local ledger.
pub async fn default_engine() -> Arc<VerificationEngine> {
    build_engine(
        Arc::new(EchoOcr::english()),
        Arc::new(PassthroughTranslator),
        Arc::new(KeywordClassifier),
        None,
    )
    .await
}

/// Clean RTC document: owner, survey, extent, village, no encumbrances.
pub const HAPPY_DOC: &str = "Village Account Form No. 2 Village: HEBBAL Taluk: Bangalore North \
District: Bangalore Owner Name: RAVI KUMAR Survey No. 45/2A Hissa No. 2 \
Extent 2 Acres 10 Guntas The record of rights tenancy and crops for the above parcel \
is maintained in the village accounts and certified by the revenue department of the \
state government of Karnataka for all purposes of land administration.";

/// As HAPPY_DOC plus one registered loan.
pub const LOAN_DOC: &str = "Village Account Form No. 2 Village: HEBBAL Taluk: Bangalore North \
District: Bangalore Owner Name: RAVI KUMAR Survey No. 45/2A Hissa No. 2 \
Extent 2 Acres 10 Guntas The record of rights tenancy and crops for the above parcel \
is maintained in the village accounts and certified by the revenue department of the \
state government of Karnataka for all purposes of land administration. \
Loan of \u{20b9}500000 from SBI outstanding as per the encumbrance column.";

/// Short risky document: owner present, no survey, one loan, one case.
pub const RISKY_DOC: &str =
    "Owner: Ravi Kumar has a loan Rs. 200,000/- from SBI and Case No: 124/2001 is recorded.";
