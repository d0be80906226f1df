//! Local simulated ledger
//!
//! SQLite-backed reference implementation of the `Ledger` contract: a
//! monotonic block height starting from a realistic base, a per-property
//! chain through `prev_block_height`, and fully deterministic references so
//! offline runs and tests reproduce byte-for-byte.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptrust_common::clock::Clock;
use proptrust_common::types::Fingerprint;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};

use super::{Ledger, LedgerEntry, LedgerError, LedgerReceipt, LedgerResult, LedgerStatus};

/// Block numbering starts here so simulated entries look like chain data.
const BASE_BLOCK_HEIGHT: i64 = 1_000_000;

pub struct LocalLedger {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
    verifier_identity: String,
}

impl LocalLedger {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>, verifier_identity: String) -> Self {
        Self {
            db,
            clock,
            verifier_identity,
        }
    }

    /// Entry reference derived from content, so identical anchors get
    /// identical handles across runs.
    fn reference(property_id: &str, fingerprint: &Fingerprint, block_height: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(property_id.as_bytes());
        hasher.update(fingerprint.as_bytes());
        hasher.update(block_height.to_be_bytes());
        format!("0x{:x}", hasher.finalize())
    }

    fn storage_err(e: sqlx::Error) -> LedgerError {
        LedgerError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn put(
        &self,
        property_id: &str,
        fingerprint: &Fingerprint,
        risk_score: u8,
    ) -> LedgerResult<LedgerReceipt> {
        let ledger_timestamp = self.clock.now();

        let mut tx = self.db.begin().await.map_err(Self::storage_err)?;

        let max_height: Option<i64> =
            sqlx::query_scalar("SELECT MAX(block_height) FROM ledger_entries")
                .fetch_one(&mut *tx)
                .await
                .map_err(Self::storage_err)?;
        let block_height = max_height.map(|h| h + 1).unwrap_or(BASE_BLOCK_HEIGHT);

        let prev_block_height: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(block_height) FROM ledger_entries WHERE property_id = ?",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(Self::storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (property_id, fingerprint, risk_score, block_height, ledger_timestamp,
                 prev_block_height, verifier_identity)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(property_id)
        .bind(fingerprint.as_bytes().as_slice())
        .bind(risk_score as i64)
        .bind(block_height)
        .bind(ledger_timestamp.to_rfc3339())
        .bind(prev_block_height)
        .bind(&self.verifier_identity)
        .execute(&mut *tx)
        .await
        .map_err(Self::storage_err)?;

        tx.commit().await.map_err(Self::storage_err)?;

        tracing::info!(
            property_id = %property_id,
            block_height,
            "Ledger entry appended"
        );

        Ok(LedgerReceipt {
            reference: Self::reference(property_id, fingerprint, block_height),
            block_height,
            ledger_timestamp,
        })
    }

    async fn get(&self, property_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT property_id, fingerprint, risk_score, block_height, ledger_timestamp
            FROM ledger_entries
            WHERE property_id = ?
            ORDER BY block_height DESC
            LIMIT 1
            "#,
        )
        .bind(property_id)
        .fetch_optional(&self.db)
        .await
        .map_err(Self::storage_err)?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let fingerprint_bytes: Vec<u8> = row.get("fingerprint");
        let fingerprint = Fingerprint::from_slice(&fingerprint_bytes)
            .map_err(|e| LedgerError::Rejected(format!("stored fingerprint corrupt: {e}")))?;
        let timestamp: String = row.get("ledger_timestamp");
        let ledger_timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| LedgerError::Rejected(format!("stored timestamp corrupt: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(LedgerEntry {
            property_id: row.get("property_id"),
            fingerprint,
            risk_score: row.get::<i64, _>("risk_score") as u8,
            block_height: row.get("block_height"),
            ledger_timestamp,
        }))
    }

    async fn history(&self, property_id: &str) -> LedgerResult<Vec<Fingerprint>> {
        let rows = sqlx::query(
            r#"
            SELECT fingerprint
            FROM ledger_entries
            WHERE property_id = ?
            ORDER BY block_height ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(&self.db)
        .await
        .map_err(Self::storage_err)?;

        // All but the latest entry are history.
        let mut fingerprints: Vec<Fingerprint> = Vec::with_capacity(rows.len());
        for row in &rows {
            let bytes: Vec<u8> = row.get("fingerprint");
            fingerprints.push(
                Fingerprint::from_slice(&bytes)
                    .map_err(|e| LedgerError::Rejected(format!("stored fingerprint corrupt: {e}")))?,
            );
        }
        fingerprints.pop();
        Ok(fingerprints)
    }

    async fn status(&self) -> LedgerStatus {
        let latest: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT MAX(block_height) FROM ledger_entries")
                .fetch_one(&self.db)
                .await;

        match latest {
            Ok(height) => LedgerStatus {
                connected: true,
                backend: "local".to_string(),
                latest_block_height: height,
            },
            Err(_) => LedgerStatus {
                connected: false,
                backend: "local".to_string(),
                latest_block_height: None,
            },
        }
    }
}
