//! Tamper check endpoint

use axum::{
    extract::{Multipart, Query, State},
    routing::post,
    Json, Router,
};
use proptrust_common::Error;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TamperParams {
    pub property_id: String,
}

/// Response for POST /tamper/check
#[derive(Debug, Serialize)]
pub struct TamperResponse {
    pub property_id: String,
    pub tamper_check_id: String,
    pub status: String,
    pub hash_matched: bool,
    pub anchored_fingerprint_hex: Option<String>,
    pub recomputed_fingerprint_hex: Option<String>,
    pub risk_score_delta: i32,
    pub warnings: Vec<String>,
}

/// POST /tamper/check?property_id=... (multipart `file`)
pub async fn tamper_check(
    State(state): State<AppState>,
    Query(params): Query<TamperParams>,
    mut multipart: Multipart,
) -> ApiResult<Json<TamperResponse>> {
    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadInput(format!("malformed multipart body: {e}")))?
    {
        if field.name().unwrap_or_default() == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::BadInput(format!("unreadable file field: {e}")))?;
            file = Some(bytes.to_vec());
        }
    }
    let document_bytes = file.ok_or_else(|| Error::BadInput("missing file field".into()))?;

    let check = state
        .engine
        .check_tamper(&params.property_id, &document_bytes, CancellationToken::new())
        .await?;

    Ok(Json(TamperResponse {
        property_id: check.property_id.clone(),
        tamper_check_id: check.tamper_check_id.clone(),
        status: check.status.as_str().to_string(),
        hash_matched: check.hash_matched,
        anchored_fingerprint_hex: check.anchored_fingerprint.map(|f| f.to_hex()),
        recomputed_fingerprint_hex: check.recomputed_fingerprint.map(|f| f.to_hex()),
        risk_score_delta: check.risk_score_delta,
        warnings: check.warnings.clone(),
    }))
}

/// Build tamper check routes
pub fn tamper_routes() -> Router<AppState> {
    Router::new().route("/tamper/check", post(tamper_check))
}
