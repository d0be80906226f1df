//! Tamper check persistence

use proptrust_common::types::Fingerprint;
use proptrust_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{TamperCheck, TamperStatus};

use super::properties::parse_timestamp;

pub async fn insert_tamper_check(pool: &SqlitePool, check: &TamperCheck) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tamper_checks
            (tamper_check_id, property_id, anchored_fingerprint, recomputed_fingerprint,
             hash_matched, risk_score_delta, status, warnings_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&check.tamper_check_id)
    .bind(&check.property_id)
    .bind(check.anchored_fingerprint.map(|f| f.as_bytes().to_vec()))
    .bind(check.recomputed_fingerprint.map(|f| f.as_bytes().to_vec()))
    .bind(check.hash_matched as i64)
    .bind(check.risk_score_delta as i64)
    .bind(check.status.as_str())
    .bind(
        serde_json::to_string(&check.warnings)
            .map_err(|e| Error::Internal(format!("serialize failed: {e}")))?,
    )
    .bind(check.created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| Error::PersistenceFailed(e.to_string()))?;
    Ok(())
}

/// Tamper checks for a property, newest first.
pub async fn get_tamper_checks(pool: &SqlitePool, property_id: &str) -> Result<Vec<TamperCheck>> {
    let rows = sqlx::query(
        "SELECT * FROM tamper_checks
         WHERE property_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let anchored: Option<Vec<u8>> = row.get("anchored_fingerprint");
            let recomputed: Option<Vec<u8>> = row.get("recomputed_fingerprint");
            let warnings: Vec<String> =
                serde_json::from_str(row.get::<String, _>("warnings_json").as_str())
                    .map_err(|e| Error::Internal(format!("stored JSON corrupt: {e}")))?;
            let created_at: String = row.get("created_at");
            Ok(TamperCheck {
                tamper_check_id: row.get("tamper_check_id"),
                property_id: row.get("property_id"),
                anchored_fingerprint: anchored
                    .as_deref()
                    .map(Fingerprint::from_slice)
                    .transpose()?,
                recomputed_fingerprint: recomputed
                    .as_deref()
                    .map(Fingerprint::from_slice)
                    .transpose()?,
                hash_matched: row.get::<i64, _>("hash_matched") != 0,
                risk_score_delta: row.get::<i64, _>("risk_score_delta") as i32,
                status: TamperStatus::parse(row.get::<String, _>("status").as_str()),
                warnings,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}
