//! proptrust-engine - Property Record Verification Service
//!
//! Ingests scanned land-record documents, runs the verification pipeline,
//! anchors fingerprints into the configured ledger backend, and serves the
//! verification/tamper-check HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use proptrust_common::config::EngineConfig;
use proptrust_engine::engine::VerificationEngine;
use proptrust_engine::{build_router, db, AppState};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting proptrust-engine (Property Record Verification)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::from_env()?;
    let db_path = PathBuf::from(&config.db_path);
    info!("Database: {}", db_path.display());

    let db_pool = db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let port = config.port;
    let engine = Arc::new(VerificationEngine::from_config(db_pool.clone(), config)?);
    info!("Verification engine initialized");

    let state = AppState::new(db_pool, engine);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{port}");
    info!("Health check: http://127.0.0.1:{port}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
