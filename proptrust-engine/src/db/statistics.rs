//! Aggregate statistics queries

use proptrust_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Counts and risk-bucket histogram for the statistics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub properties: i64,
    pub verifications: i64,
    pub tamper_checks: i64,
    pub anchored_verifications: i64,
    pub risk_low: i64,
    pub risk_medium: i64,
    pub risk_high: i64,
}

pub async fn collect(pool: &SqlitePool) -> Result<Statistics> {
    let properties: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
        .fetch_one(pool)
        .await?;
    let verifications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_records")
        .fetch_one(pool)
        .await?;
    let tamper_checks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tamper_checks")
        .fetch_one(pool)
        .await?;
    let anchored_verifications: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM verification_records WHERE anchor_reference IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;
    let risk_low: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM verification_records WHERE risk_level = 'LOW'")
            .fetch_one(pool)
            .await?;
    let risk_medium: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM verification_records WHERE risk_level = 'MEDIUM'",
    )
    .fetch_one(pool)
    .await?;
    let risk_high: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM verification_records WHERE risk_level = 'HIGH'")
            .fetch_one(pool)
            .await?;

    Ok(Statistics {
        properties,
        verifications,
        tamper_checks,
        anchored_verifications,
        risk_low,
        risk_medium,
        risk_high,
    })
}
