//! Integration tests for the engine HTTP API

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::*;
use proptrust_engine::{build_router, AppState};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "proptrust-test-boundary";

async fn setup_app() -> (axum::Router, AppState) {
    let engine = default_engine().await;
    let state = AppState::new(engine.db().clone(), engine);
    (build_router(state.clone()), state)
}

fn multipart_body(doc: &str, document_type: &str, store_on_ledger: bool) -> Vec<u8> {
    let mut body = String::new();
    body.push_str(&format!("--{BOUNDARY}\r\n"));
    body.push_str(
        "Content-Disposition: form-data; name=\"file\"; filename=\"45.2A_page_1.jpg\"\r\n",
    );
    body.push_str("Content-Type: application/octet-stream\r\n\r\n");
    body.push_str(doc);
    body.push_str("\r\n");
    body.push_str(&format!("--{BOUNDARY}\r\n"));
    body.push_str("Content-Disposition: form-data; name=\"document_type\"\r\n\r\n");
    body.push_str(document_type);
    body.push_str("\r\n");
    body.push_str(&format!("--{BOUNDARY}\r\n"));
    body.push_str("Content-Disposition: form-data; name=\"store_on_ledger\"\r\n\r\n");
    body.push_str(if store_on_ledger { "true" } else { "false" });
    body.push_str("\r\n");
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body.into_bytes()
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _) = setup_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "proptrust-engine");
}

#[tokio::test]
async fn verify_upload_returns_record_and_ledger_block() {
    let (app, _) = setup_app().await;
    let response = app
        .oneshot(multipart_request(
            "/verify/upload",
            multipart_body(HAPPY_DOC, "RTC", true),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert!(json["property_id"].as_str().unwrap().starts_with("PRT-"));
    assert_eq!(json["risk_score"], 0);
    assert_eq!(json["risk_level"], "LOW");
    assert_eq!(json["entities"]["owner"], "RAVI KUMAR");
    assert_eq!(json["classification"]["label"], "CLEAR_TITLE");
    assert_eq!(json["ledger"]["stored"], true);
    assert_eq!(json["ledger"]["block_height"], 1_000_000);
    assert_eq!(json["ledger"]["fingerprint_hex"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn verify_upload_without_file_is_bad_request() {
    let (app, _) = setup_app().await;
    let mut body = String::new();
    body.push_str(&format!("--{BOUNDARY}\r\n"));
    body.push_str("Content-Disposition: form-data; name=\"document_type\"\r\n\r\nRTC\r\n");
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let response = app
        .oneshot(multipart_request("/verify/upload", body.into_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "BAD_INPUT");
}

#[tokio::test]
async fn tamper_check_round_trip_via_api() {
    let (app, _) = setup_app().await;

    let upload = app
        .clone()
        .oneshot(multipart_request(
            "/verify/upload",
            multipart_body(HAPPY_DOC, "RTC", true),
        ))
        .await
        .unwrap();
    let upload_json = extract_json(upload.into_body()).await;
    let property_id = upload_json["property_id"].as_str().unwrap().to_string();

    // Same document: VERIFIED.
    let clean = app
        .clone()
        .oneshot(multipart_request(
            &format!("/tamper/check?property_id={property_id}"),
            multipart_body(HAPPY_DOC, "RTC", false),
        ))
        .await
        .unwrap();
    assert_eq!(clean.status(), StatusCode::OK);
    let clean_json = extract_json(clean.into_body()).await;
    assert_eq!(clean_json["status"], "VERIFIED");
    assert_eq!(clean_json["hash_matched"], true);
    assert_eq!(clean_json["risk_score_delta"], 0);
    assert_eq!(
        clean_json["anchored_fingerprint_hex"],
        clean_json["recomputed_fingerprint_hex"]
    );

    // Tampered owner: TAMPERED.
    let tampered_doc = HAPPY_DOC.replace("RAVI KUMAR", "RAVI KUMAS");
    let tampered = app
        .oneshot(multipart_request(
            &format!("/tamper/check?property_id={property_id}"),
            multipart_body(&tampered_doc, "RTC", false),
        ))
        .await
        .unwrap();
    let tampered_json = extract_json(tampered.into_body()).await;
    assert_eq!(tampered_json["status"], "TAMPERED");
    assert_eq!(tampered_json["hash_matched"], false);
}

#[tokio::test]
async fn tamper_check_unknown_property_reports_not_found_status() {
    let (app, _) = setup_app().await;
    let response = app
        .oneshot(multipart_request(
            "/tamper/check?property_id=PRT-ghost",
            multipart_body(HAPPY_DOC, "RTC", false),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "NOT_FOUND");
}

#[tokio::test]
async fn get_delete_verification_lifecycle() {
    let (app, _) = setup_app().await;

    let missing = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/verification/PRT-none")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let upload = app
        .clone()
        .oneshot(multipart_request(
            "/verify/upload",
            multipart_body(HAPPY_DOC, "RTC", false),
        ))
        .await
        .unwrap();
    let upload_json = extract_json(upload.into_body()).await;
    let property_id = upload_json["property_id"].as_str().unwrap().to_string();

    let found = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/verification/{property_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let found_json = extract_json(found.into_body()).await;
    assert_eq!(found_json["record"]["risk_level"], "LOW");
    assert_eq!(found_json["detail"]["entities"]["owner"], "RAVI KUMAR");

    let history = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/verification/{property_id}/history"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let history_json = extract_json(history.into_body()).await;
    assert_eq!(history_json["records"].as_array().unwrap().len(), 1);

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/verification/{property_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/verification/{property_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_status_reports_connected_local_backend() {
    let (app, _) = setup_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/ledger/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["backend"], "local");
}

#[tokio::test]
async fn statistics_reflect_activity() {
    let (app, _) = setup_app().await;

    app.clone()
        .oneshot(multipart_request(
            "/verify/upload",
            multipart_body(HAPPY_DOC, "RTC", true),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(multipart_request(
            "/verify/upload",
            multipart_body(RISKY_DOC, "RTC", false),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/statistics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["properties"], 2);
    assert_eq!(json["verifications"], 2);
    assert_eq!(json["anchored_verifications"], 1);
    assert_eq!(json["risk_low"], 1);
    assert_eq!(json["risk_high"], 1);
}
