//! Verification record retrieval and deletion

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use proptrust_common::Error;
use serde::Serialize;
use serde_json::{json, Value};

use crate::db;
use crate::error::ApiResult;
use crate::models::{VerificationDetail, VerificationRecord};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecordDto {
    pub verification_id: String,
    pub property_id: String,
    pub risk_score: u8,
    pub risk_level: String,
    pub classification_label: String,
    pub classification_confidence: f64,
    pub fingerprint_hex: String,
    pub anchor_reference: Option<String>,
    pub anchor_block_height: Option<i64>,
    pub anchor_timestamp: Option<String>,
    pub created_at: String,
}

impl RecordDto {
    fn from_record(record: &VerificationRecord) -> Self {
        Self {
            verification_id: record.verification_id.clone(),
            property_id: record.property_id.clone(),
            risk_score: record.risk_score,
            risk_level: record.risk_level.as_str().to_string(),
            classification_label: record.classification_label.as_str().to_string(),
            classification_confidence: record.classification_confidence,
            fingerprint_hex: record.fingerprint.to_hex(),
            anchor_reference: record.anchor_reference.clone(),
            anchor_block_height: record.anchor_block_height,
            anchor_timestamp: record.anchor_timestamp.map(|t| t.to_rfc3339()),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

fn detail_dto(detail: &VerificationDetail) -> Value {
    json!({
        "entities": detail.entities,
        "cleaned_text_preview": detail.cleaned_text_preview,
        "pages_processed": detail.pages_processed,
        "chars_original": detail.chars_original,
        "chars_cleaned": detail.chars_cleaned,
        "risk_factors": detail.risk_factors,
        "recommendations": detail.recommendations,
        "warnings": detail.warnings,
    })
}

/// GET /verification/:property_id - latest record + detail
pub async fn get_verification(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (record, detail) = db::verifications::get_latest(&state.db, &property_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no verification for property {property_id}")))?;

    Ok(Json(json!({
        "record": RecordDto::from_record(&record),
        "detail": detail_dto(&detail),
    })))
}

/// GET /verification/:property_id/history - all records, newest first
pub async fn get_verification_history(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let records = db::verifications::get_history(&state.db, &property_id).await?;
    if records.is_empty() {
        return Err(Error::NotFound(format!("no verification for property {property_id}")).into());
    }
    let dtos: Vec<RecordDto> = records.iter().map(RecordDto::from_record).collect();
    Ok(Json(json!({
        "property_id": property_id,
        "records": dtos,
    })))
}

/// DELETE /verification/:property_id - cascade delete, ledger untouched
pub async fn delete_verification(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state.engine.delete_property(&property_id).await?;
    if !deleted {
        return Err(Error::NotFound(format!("property {property_id} not found")).into());
    }
    Ok(Json(json!({ "deleted": true, "property_id": property_id })))
}

/// Build record retrieval routes
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/verification/:property_id",
            get(get_verification).delete(delete_verification),
        )
        .route(
            "/verification/:property_id/history",
            get(get_verification_history),
        )
}
