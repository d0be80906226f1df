//! Property persistence

use chrono::{DateTime, Utc};
use proptrust_common::types::DocumentType;
use proptrust_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::Property;

/// Upsert a property row. First insert wins for `created_at` and
/// `document_type`; the denormalized search fields track the latest
/// verification.
pub async fn upsert_property(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    property: &Property,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO properties (property_id, document_type, created_at, owner_name, survey_number)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(property_id) DO UPDATE SET
            owner_name = excluded.owner_name,
            survey_number = excluded.survey_number
        "#,
    )
    .bind(&property.property_id)
    .bind(property.document_type.as_str())
    .bind(property.created_at.to_rfc3339())
    .bind(&property.owner_name)
    .bind(&property.survey_number)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn get_property(pool: &SqlitePool, property_id: &str) -> Result<Option<Property>> {
    let row = sqlx::query(
        "SELECT property_id, document_type, created_at, owner_name, survey_number
         FROM properties WHERE property_id = ?",
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?;

    match row {
        None => Ok(None),
        Some(row) => {
            let created_at: String = row.get("created_at");
            Ok(Some(Property {
                property_id: row.get("property_id"),
                document_type: DocumentType::parse(row.get::<String, _>("document_type").as_str()),
                created_at: parse_timestamp(&created_at)?,
                owner_name: row.get("owner_name"),
                survey_number: row.get("survey_number"),
            }))
        }
    }
}

/// Cascade delete of a property: verification records, details and tamper
/// checks go with it. The ledger is never touched; anchored fingerprints
/// outlive local state by design of the append-only store.
pub async fn delete_property(pool: &SqlitePool, property_id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let exists: Option<String> =
        sqlx::query_scalar("SELECT property_id FROM properties WHERE property_id = ?")
            .bind(property_id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Ok(false);
    }

    sqlx::query(
        "DELETE FROM verification_details WHERE verification_id IN
            (SELECT verification_id FROM verification_records WHERE property_id = ?)",
    )
    .bind(property_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM verification_records WHERE property_id = ?")
        .bind(property_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tamper_checks WHERE property_id = ?")
        .bind(property_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM properties WHERE property_id = ?")
        .bind(property_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| proptrust_common::Error::Internal(format!("stored timestamp corrupt: {e}")))?
        .with_timezone(&Utc))
}
