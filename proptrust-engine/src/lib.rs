//! proptrust-engine - Property Record Verification Engine
//!
//! Ingests scanned land-record documents (RTC, MR, EC, sale deeds), runs the
//! extraction pipeline, scores risk, fingerprints the canonical verification
//! record and anchors the fingerprint into an append-only ledger. A later
//! upload for the same property is re-verified against the anchored
//! fingerprint to detect tampering.

pub mod api;
pub mod db;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod ledger;
pub mod models;
pub mod services;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::engine::VerificationEngine;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// The verification engine with its injected adapters
    pub engine: Arc<VerificationEngine>,
    /// Service startup time, for the health endpoint
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, engine: Arc<VerificationEngine>) -> Self {
        Self {
            db,
            engine,
            startup_time: chrono::Utc::now(),
        }
    }
}

/// Build application router
///
/// Endpoints:
/// - POST /verify/upload - Verify an uploaded document, optionally anchoring
/// - POST /tamper/check - Re-verify an upload against the anchored fingerprint
/// - GET /verification/:property_id - Latest verification record + detail
/// - GET /verification/:property_id/history - All verification records
/// - DELETE /verification/:property_id - Cascade delete (ledger untouched)
/// - GET /ledger/status - Ledger connectivity and latest block height
/// - GET /statistics - Counts and risk-bucket histogram
/// - GET /health - Health check
pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .merge(api::verify_routes())
        .merge(api::tamper_routes())
        .merge(api::record_routes())
        .merge(api::ledger_routes())
        .merge(api::statistics_routes())
        .merge(api::health_routes())
        .with_state(state)
}
