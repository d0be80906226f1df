//! Append-only ledger abstraction
//!
//! The ledger binds a property id to the fingerprint of its latest
//! verification, keeping every superseded fingerprint in per-property
//! history. Nothing is ever removed. Two backends satisfy the same
//! contract: a deterministic SQLite-backed store and a remote chain client;
//! the engine code is identical in both paths.

mod local;
mod remote;

pub use local::LocalLedger;
pub use remote::RemoteLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptrust_common::types::Fingerprint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger operation errors. "Not found" is not an error: `get` returns
/// `Option` and the tamper checker pattern-matches on it.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Backend unreachable
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Backend returned a structured rejection
    #[error("Ledger rejected the operation: {0}")]
    Rejected(String),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Handle returned by a successful anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Opaque reference identifying the new entry (transaction hash style).
    pub reference: String,
    pub block_height: i64,
    pub ledger_timestamp: DateTime<Utc>,
}

/// Latest anchored entry for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub property_id: String,
    pub fingerprint: Fingerprint,
    pub risk_score: u8,
    pub block_height: i64,
    pub ledger_timestamp: DateTime<Utc>,
}

/// Connectivity report for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub connected: bool,
    pub backend: String,
    pub latest_block_height: Option<i64>,
}

/// Append-only store keyed by property id.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append an entry. An existing property id keeps its prior fingerprint
    /// in history; equal consecutive fingerprints are appended too, so
    /// history records attempts, not just changes.
    async fn put(
        &self,
        property_id: &str,
        fingerprint: &Fingerprint,
        risk_score: u8,
    ) -> LedgerResult<LedgerReceipt>;

    /// Latest entry for a property, or `None` when never anchored.
    async fn get(&self, property_id: &str) -> LedgerResult<Option<LedgerEntry>>;

    /// Superseded fingerprints for a property, oldest first. The latest
    /// fingerprint is not included.
    async fn history(&self, property_id: &str) -> LedgerResult<Vec<Fingerprint>>;

    /// Equality check against the latest entry.
    async fn verify(&self, property_id: &str, fingerprint: &Fingerprint) -> LedgerResult<bool> {
        Ok(self
            .get(property_id)
            .await?
            .map(|entry| entry.fingerprint == *fingerprint)
            .unwrap_or(false))
    }

    /// Backend connectivity and latest block height.
    async fn status(&self) -> LedgerStatus;
}
