//! Document verification endpoint

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use proptrust_common::types::DocumentType;
use proptrust_common::Error;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::engine::VerifyRequest;
use crate::error::ApiResult;
use crate::AppState;

/// Response for POST /verify/upload
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub property_id: String,
    pub verification_id: String,
    pub risk_score: u8,
    pub risk_level: String,
    pub risk_factors: Value,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub entities: Value,
    pub classification: Value,
    pub ledger: Value,
}

/// POST /verify/upload (multipart)
///
/// Fields: `file` (document bytes), `document_type`, `store_on_ledger`.
pub async fn verify_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<VerifyResponse>> {
    let mut file: Option<Vec<u8>> = None;
    let mut document_type = DocumentType::Unknown;
    let mut store_on_ledger = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadInput(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadInput(format!("unreadable file field: {e}")))?;
                file = Some(bytes.to_vec());
            }
            "document_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::BadInput(format!("unreadable document_type: {e}")))?;
                document_type = DocumentType::parse(&value);
            }
            "store_on_ledger" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::BadInput(format!("unreadable store_on_ledger: {e}")))?;
                store_on_ledger = matches!(value.trim(), "true" | "1" | "on" | "yes");
            }
            _ => {}
        }
    }

    let document_bytes = file.ok_or_else(|| Error::BadInput("missing file field".into()))?;

    let outcome = state
        .engine
        .verify(VerifyRequest {
            document_bytes,
            declared_type: document_type,
            property_id: None,
            anchor: store_on_ledger,
            cancel: CancellationToken::new(),
        })
        .await?;

    let record = &outcome.record;
    let detail = &outcome.detail;

    let ledger = json!({
        "stored": record.anchor_reference.is_some(),
        "fingerprint_hex": record.fingerprint.to_hex(),
        "reference": record.anchor_reference,
        "block_height": record.anchor_block_height,
    });

    Ok(Json(VerifyResponse {
        property_id: record.property_id.clone(),
        verification_id: record.verification_id.clone(),
        risk_score: record.risk_score,
        risk_level: record.risk_level.as_str().to_string(),
        risk_factors: serde_json::to_value(&detail.risk_factors).unwrap_or_default(),
        recommendations: detail.recommendations.clone(),
        warnings: detail.warnings.clone(),
        entities: serde_json::to_value(&detail.entities).unwrap_or_default(),
        classification: json!({
            "label": record.classification_label.as_str(),
            "confidence": record.classification_confidence,
        }),
        ledger,
    }))
}

/// Build verification upload routes
pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/verify/upload", post(verify_upload))
}
