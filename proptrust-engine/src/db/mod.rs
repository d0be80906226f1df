//! Database access for the verification engine
//!
//! One shared SQLite database holds properties, verification records and
//! details, tamper checks, the audit trail, and the local ledger backend's
//! entries. Schema creation is idempotent and runs at startup.

pub mod audit;
pub mod properties;
pub mod statistics;
pub mod tamper_checks;
pub mod verifications;

use proptrust_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool and create tables if needed.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all engine tables and indices (idempotent).
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    create_properties_table(pool).await?;
    create_verification_records_table(pool).await?;
    create_verification_details_table(pool).await?;
    create_tamper_checks_table(pool).await?;
    create_audit_logs_table(pool).await?;
    create_ledger_entries_table(pool).await?;

    tracing::info!("Database tables initialized");
    Ok(())
}

async fn create_properties_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            property_id TEXT PRIMARY KEY,
            document_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            owner_name TEXT,
            survey_number TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_verification_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verification_records (
            verification_id TEXT PRIMARY KEY,
            property_id TEXT NOT NULL,
            risk_score INTEGER NOT NULL,
            risk_level TEXT NOT NULL,
            classification_label TEXT NOT NULL,
            classification_confidence REAL NOT NULL,
            fingerprint BLOB NOT NULL,
            anchor_reference TEXT,
            anchor_block_height INTEGER,
            anchor_timestamp TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_verification_records_property_id
         ON verification_records(property_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_verification_records_created_at
         ON verification_records(created_at)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_verification_details_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verification_details (
            verification_id TEXT PRIMARY KEY,
            entities_json TEXT NOT NULL,
            cleaned_text_preview TEXT NOT NULL,
            pages_processed INTEGER NOT NULL,
            chars_original INTEGER NOT NULL,
            chars_cleaned INTEGER NOT NULL,
            risk_factors_json TEXT NOT NULL,
            recommendations_json TEXT NOT NULL,
            warnings_json TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_tamper_checks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tamper_checks (
            tamper_check_id TEXT PRIMARY KEY,
            property_id TEXT NOT NULL,
            anchored_fingerprint BLOB,
            recomputed_fingerprint BLOB,
            hash_matched INTEGER NOT NULL,
            risk_score_delta INTEGER NOT NULL,
            status TEXT NOT NULL,
            warnings_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tamper_checks_property_id
         ON tamper_checks(property_id)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_audit_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            operation TEXT NOT NULL,
            property_id TEXT,
            status TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at
         ON audit_logs(created_at)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_ledger_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ledger_entries (
            block_height INTEGER PRIMARY KEY,
            property_id TEXT NOT NULL,
            fingerprint BLOB NOT NULL,
            risk_score INTEGER NOT NULL,
            ledger_timestamp TEXT NOT NULL,
            prev_block_height INTEGER,
            verifier_identity TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entries_property_id
         ON ledger_entries(property_id)",
    )
    .execute(pool)
    .await?;
    Ok(())
}
