//! Verification record and detail persistence
//!
//! Record + detail + property upsert commit in one transaction; the anchor
//! fields are filled in by a second transaction after the ledger confirms.

use chrono::{DateTime, Utc};
use proptrust_common::types::{Fingerprint, RiskLevel};
use proptrust_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{
    ClassLabel, Property, RiskFactor, VerificationDetail, VerificationRecord,
};

use super::properties::{parse_timestamp, upsert_property};

/// Atomically persist property (upsert), record and detail.
pub async fn insert_verification(
    pool: &SqlitePool,
    property: &Property,
    record: &VerificationRecord,
    detail: &VerificationDetail,
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::PersistenceFailed(e.to_string()))?;

    upsert_property(&mut tx, property).await?;

    sqlx::query(
        r#"
        INSERT INTO verification_records
            (verification_id, property_id, risk_score, risk_level,
             classification_label, classification_confidence, fingerprint,
             anchor_reference, anchor_block_height, anchor_timestamp, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.verification_id)
    .bind(&record.property_id)
    .bind(record.risk_score as i64)
    .bind(record.risk_level.as_str())
    .bind(record.classification_label.as_str())
    .bind(record.classification_confidence)
    .bind(record.fingerprint.as_bytes().as_slice())
    .bind(&record.anchor_reference)
    .bind(record.anchor_block_height)
    .bind(record.anchor_timestamp.map(|t| t.to_rfc3339()))
    .bind(record.created_at.to_rfc3339())
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::PersistenceFailed(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO verification_details
            (verification_id, entities_json, cleaned_text_preview, pages_processed,
             chars_original, chars_cleaned, risk_factors_json, recommendations_json,
             warnings_json)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&detail.verification_id)
    .bind(to_json(&detail.entities)?)
    .bind(&detail.cleaned_text_preview)
    .bind(detail.pages_processed as i64)
    .bind(detail.chars_original as i64)
    .bind(detail.chars_cleaned as i64)
    .bind(to_json(&detail.risk_factors)?)
    .bind(to_json(&detail.recommendations)?)
    .bind(to_json(&detail.warnings)?)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::PersistenceFailed(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::PersistenceFailed(e.to_string()))?;
    Ok(())
}

/// Fill in the anchor fields after a successful ledger put.
pub async fn set_anchor(
    pool: &SqlitePool,
    verification_id: &str,
    reference: &str,
    block_height: i64,
    anchor_timestamp: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE verification_records
        SET anchor_reference = ?, anchor_block_height = ?, anchor_timestamp = ?
        WHERE verification_id = ?
        "#,
    )
    .bind(reference)
    .bind(block_height)
    .bind(anchor_timestamp.to_rfc3339())
    .bind(verification_id)
    .execute(pool)
    .await
    .map_err(|e| Error::PersistenceFailed(e.to_string()))?;
    Ok(())
}

/// Latest record + detail for a property, newest `created_at` first,
/// breaking ties by verification id for stability.
pub async fn get_latest(
    pool: &SqlitePool,
    property_id: &str,
) -> Result<Option<(VerificationRecord, VerificationDetail)>> {
    let record = match get_latest_record(pool, property_id).await? {
        Some(record) => record,
        None => return Ok(None),
    };
    let detail = get_detail(pool, &record.verification_id).await?.ok_or_else(|| {
        Error::Internal(format!(
            "verification {} has no detail row",
            record.verification_id
        ))
    })?;
    Ok(Some((record, detail)))
}

pub async fn get_latest_record(
    pool: &SqlitePool,
    property_id: &str,
) -> Result<Option<VerificationRecord>> {
    let row = sqlx::query(
        "SELECT * FROM verification_records
         WHERE property_id = ?
         ORDER BY created_at DESC, rowid DESC
         LIMIT 1",
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?;
    row.map(|r| record_from_row(&r)).transpose()
}

/// All records for a property, newest first.
pub async fn get_history(
    pool: &SqlitePool,
    property_id: &str,
) -> Result<Vec<VerificationRecord>> {
    let rows = sqlx::query(
        "SELECT * FROM verification_records
         WHERE property_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn get_detail(
    pool: &SqlitePool,
    verification_id: &str,
) -> Result<Option<VerificationDetail>> {
    let row = sqlx::query("SELECT * FROM verification_details WHERE verification_id = ?")
        .bind(verification_id)
        .fetch_optional(pool)
        .await?;

    match row {
        None => Ok(None),
        Some(row) => {
            let entities = from_json(row.get::<String, _>("entities_json").as_str())?;
            let risk_factors: Vec<RiskFactor> =
                from_json(row.get::<String, _>("risk_factors_json").as_str())?;
            let recommendations: Vec<String> =
                from_json(row.get::<String, _>("recommendations_json").as_str())?;
            let warnings: Vec<String> =
                from_json(row.get::<String, _>("warnings_json").as_str())?;
            Ok(Some(VerificationDetail {
                verification_id: row.get("verification_id"),
                entities,
                cleaned_text_preview: row.get("cleaned_text_preview"),
                pages_processed: row.get::<i64, _>("pages_processed") as u32,
                chars_original: row.get::<i64, _>("chars_original") as usize,
                chars_cleaned: row.get::<i64, _>("chars_cleaned") as usize,
                risk_factors,
                recommendations,
                warnings,
            }))
        }
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<VerificationRecord> {
    let fingerprint_bytes: Vec<u8> = row.get("fingerprint");
    let anchor_timestamp: Option<String> = row.get("anchor_timestamp");
    let created_at: String = row.get("created_at");
    Ok(VerificationRecord {
        verification_id: row.get("verification_id"),
        property_id: row.get("property_id"),
        risk_score: row.get::<i64, _>("risk_score") as u8,
        risk_level: RiskLevel::parse(row.get::<String, _>("risk_level").as_str()),
        classification_label: ClassLabel::parse(
            row.get::<String, _>("classification_label").as_str(),
        ),
        classification_confidence: row.get("classification_confidence"),
        fingerprint: Fingerprint::from_slice(&fingerprint_bytes)?,
        anchor_reference: row.get("anchor_reference"),
        anchor_block_height: row.get("anchor_block_height"),
        anchor_timestamp: anchor_timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Internal(format!("serialize failed: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::Internal(format!("stored JSON corrupt: {e}")))
}
