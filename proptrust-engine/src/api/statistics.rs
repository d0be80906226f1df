//! Statistics endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::db::statistics::{self, Statistics};
use crate::error::ApiResult;
use crate::AppState;

/// GET /statistics - counts and risk-bucket histogram
pub async fn get_statistics(State(state): State<AppState>) -> ApiResult<Json<Statistics>> {
    let stats = statistics::collect(&state.db).await?;
    Ok(Json(stats))
}

/// Build statistics routes
pub fn statistics_routes() -> Router<AppState> {
    Router::new().route("/statistics", get(get_statistics))
}
