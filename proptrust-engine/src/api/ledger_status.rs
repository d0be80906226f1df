//! Ledger status endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::ledger::LedgerStatus;
use crate::AppState;

/// GET /ledger/status
pub async fn ledger_status(State(state): State<AppState>) -> Json<LedgerStatus> {
    Json(state.engine.ledger().status().await)
}

/// Build ledger status routes
pub fn ledger_routes() -> Router<AppState> {
    Router::new().route("/ledger/status", get(ledger_status))
}
