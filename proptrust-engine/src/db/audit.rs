//! Audit trail persistence
//!
//! Append-only; writes are best-effort from the callers' perspective but
//! failures are surfaced so the orchestrator can log them.

use chrono::{DateTime, Utc};
use proptrust_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{AuditEntry, AuditOperation, AuditStatus};

use super::properties::parse_timestamp;

pub async fn append(
    pool: &SqlitePool,
    operation: AuditOperation,
    property_id: Option<&str>,
    status: AuditStatus,
    message: &str,
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (operation, property_id, status, message, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(operation.as_str())
    .bind(property_id)
    .bind(status.as_str())
    .bind(message)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent audit entries, newest first.
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<AuditEntry>> {
    let rows = sqlx::query(
        "SELECT id, operation, property_id, status, message, created_at
         FROM audit_logs ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let created_at: String = row.get("created_at");
            Ok(AuditEntry {
                id: row.get("id"),
                operation: parse_operation(row.get::<String, _>("operation").as_str()),
                property_id: row.get("property_id"),
                status: if row.get::<String, _>("status") == "SUCCESS" {
                    AuditStatus::Success
                } else {
                    AuditStatus::Failure
                },
                message: row.get("message"),
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

/// Entries for one operation type, newest first (used by tests and the
/// statistics endpoint).
pub async fn by_operation(
    pool: &SqlitePool,
    operation: AuditOperation,
) -> Result<Vec<AuditEntry>> {
    let rows = sqlx::query(
        "SELECT id, operation, property_id, status, message, created_at
         FROM audit_logs WHERE operation = ? ORDER BY id DESC",
    )
    .bind(operation.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let created_at: String = row.get("created_at");
            Ok(AuditEntry {
                id: row.get("id"),
                operation: parse_operation(row.get::<String, _>("operation").as_str()),
                property_id: row.get("property_id"),
                status: if row.get::<String, _>("status") == "SUCCESS" {
                    AuditStatus::Success
                } else {
                    AuditStatus::Failure
                },
                message: row.get("message"),
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

fn parse_operation(raw: &str) -> AuditOperation {
    match raw {
        "VERIFY" => AuditOperation::Verify,
        "TAMPER_CHECK" => AuditOperation::TamperCheck,
        "DELETE" => AuditOperation::Delete,
        "LEDGER_ANCHOR" => AuditOperation::LedgerAnchor,
        _ => AuditOperation::LedgerFailure,
    }
}
