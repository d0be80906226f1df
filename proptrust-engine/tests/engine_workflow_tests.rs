//! End-to-end engine tests: verification, anchoring, tamper checking,
//! degraded stages, cascade delete.

mod helpers;

use std::sync::Arc;

use helpers::*;
use proptrust_common::types::{DocumentType, RiskLevel};
use proptrust_engine::db;
use proptrust_engine::engine::VerifyRequest;
use proptrust_engine::extractors::{KeywordClassifier, PassthroughTranslator};
use proptrust_engine::models::{
    AuditOperation, AuditStatus, ClassLabel, Classification, TamperStatus,
};
use tokio_util::sync::CancellationToken;

fn request(doc: &str, property_id: Option<&str>, anchor: bool) -> VerifyRequest {
    VerifyRequest {
        document_bytes: doc.as_bytes().to_vec(),
        declared_type: DocumentType::Rtc,
        property_id: property_id.map(|s| s.to_string()),
        anchor,
        cancel: CancellationToken::new(),
    }
}

#[tokio::test]
async fn happy_path_low_risk() {
    let engine = default_engine().await;
    let outcome = engine.verify(request(HAPPY_DOC, None, false)).await.unwrap();

    assert_eq!(outcome.record.risk_score, 0);
    assert_eq!(outcome.record.risk_level, RiskLevel::Low);
    assert!(outcome.detail.risk_factors.is_empty());
    assert!(!outcome.record.fingerprint.is_zero());

    let entities = &outcome.detail.entities;
    assert_eq!(entities.owner.as_deref(), Some("RAVI KUMAR"));
    assert_eq!(entities.survey_number.as_deref(), Some("45/2A"));
    assert_eq!(entities.village.as_deref(), Some("HEBBAL"));
    assert_eq!(entities.extent_acres, Some(2));
    assert_eq!(entities.extent_guntas, Some(10));
    assert!(entities.loans.is_empty());
    assert!(entities.case_numbers.is_empty());
}

#[tokio::test]
async fn loan_present_is_boundary_low() {
    let engine = default_engine().await;
    let outcome = engine.verify(request(LOAN_DOC, None, false)).await.unwrap();

    assert_eq!(outcome.record.risk_score, 30);
    assert_eq!(outcome.record.risk_level, RiskLevel::Low);
    assert!(outcome
        .detail
        .risk_factors
        .iter()
        .any(|f| f.code == "loan_present"));
    assert_eq!(outcome.detail.entities.loans.len(), 1);
    assert_eq!(outcome.detail.entities.loans[0].amount, 500_000);
}

#[tokio::test]
async fn multiple_factors_score_seventy() {
    // Classifier pinned to UNKNOWN so only the entity-driven factors fire.
    let engine = build_engine(
        Arc::new(EchoOcr::english()),
        Arc::new(PassthroughTranslator),
        Arc::new(FixedClassifier(Classification::unknown())),
        None,
    )
    .await;
    let outcome = engine.verify(request(RISKY_DOC, None, false)).await.unwrap();

    assert_eq!(outcome.record.risk_score, 70);
    assert_eq!(outcome.record.risk_level, RiskLevel::High);
    let codes: Vec<&str> = outcome
        .detail
        .risk_factors
        .iter()
        .map(|f| f.code.as_str())
        .collect();
    assert_eq!(
        codes,
        vec!["loan_present", "legal_case", "survey_missing", "data_quality_low"]
    );
}

#[tokio::test]
async fn identical_documents_yield_identical_fingerprints() {
    let engine = default_engine().await;
    let first = engine
        .verify(request(HAPPY_DOC, Some("PRT-same"), false))
        .await
        .unwrap();
    let second = engine
        .verify(request(HAPPY_DOC, Some("PRT-same"), false))
        .await
        .unwrap();

    assert_eq!(first.record.fingerprint, second.record.fingerprint);
    assert_ne!(first.record.verification_id, second.record.verification_id);
    assert_eq!(first.detail.entities, second.detail.entities);

    // A separate engine instance (fresh process state) agrees.
    let other_engine = default_engine().await;
    let third = other_engine
        .verify(request(HAPPY_DOC, Some("PRT-same"), false))
        .await
        .unwrap();
    assert_eq!(first.record.fingerprint, third.record.fingerprint);
}

#[tokio::test]
async fn second_anchor_pushes_history() {
    let engine = default_engine().await;
    let first = engine
        .verify(request(HAPPY_DOC, Some("PRT-hist"), true))
        .await
        .unwrap();
    let second = engine
        .verify(request(LOAN_DOC, Some("PRT-hist"), true))
        .await
        .unwrap();

    let ledger = engine.ledger();
    let latest = ledger.get("PRT-hist").await.unwrap().unwrap();
    assert_eq!(latest.fingerprint, second.record.fingerprint);

    let history = ledger.history("PRT-hist").await.unwrap();
    assert_eq!(history, vec![first.record.fingerprint]);
}

#[tokio::test]
async fn anchored_then_reverified_unchanged_is_verified() {
    let engine = default_engine().await;
    let outcome = engine
        .verify(request(HAPPY_DOC, Some("PRT-clean"), true))
        .await
        .unwrap();
    assert!(outcome.record.anchor_reference.is_some());
    assert!(outcome.record.anchor_block_height.is_some());

    let check = engine
        .check_tamper(
            "PRT-clean",
            HAPPY_DOC.as_bytes(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(check.status, TamperStatus::Verified);
    assert!(check.hash_matched);
    assert_eq!(check.risk_score_delta, 0);
    assert_eq!(check.anchored_fingerprint, Some(outcome.record.fingerprint));
    assert_eq!(
        check.recomputed_fingerprint,
        Some(outcome.record.fingerprint)
    );
}

#[tokio::test]
async fn tampered_owner_is_detected() {
    let engine = default_engine().await;
    engine
        .verify(request(HAPPY_DOC, Some("PRT-tamper"), true))
        .await
        .unwrap();

    // Flip the last letter of the owner's name.
    let tampered = HAPPY_DOC.replace("RAVI KUMAR", "RAVI KUMAS");
    let check = engine
        .check_tamper("PRT-tamper", tampered.as_bytes(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(check.status, TamperStatus::Tampered);
    assert!(!check.hash_matched);
    assert!(check
        .warnings
        .iter()
        .any(|w| w == "field_changed:owner"));
}

#[tokio::test]
async fn added_loan_reports_factor_and_field_diff() {
    let engine = default_engine().await;
    engine
        .verify(request(HAPPY_DOC, Some("PRT-loan-diff"), true))
        .await
        .unwrap();

    let check = engine
        .check_tamper("PRT-loan-diff", LOAN_DOC.as_bytes(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(check.status, TamperStatus::Tampered);
    assert_eq!(check.risk_score_delta, 30);
    assert!(check.warnings.iter().any(|w| w == "factor_added:loan_present"));
    assert!(check.warnings.iter().any(|w| w == "field_changed:loans"));
}

#[tokio::test]
async fn tamper_check_for_unknown_property_is_not_found_and_persisted() {
    let engine = default_engine().await;
    let check = engine
        .check_tamper("PRT-ghost", HAPPY_DOC.as_bytes(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(check.status, TamperStatus::NotFound);
    assert!(!check.hash_matched);

    let stored = db::tamper_checks::get_tamper_checks(engine.db(), "PRT-ghost")
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, TamperStatus::NotFound);
}

#[tokio::test]
async fn ledger_offline_verify_degrades_to_null_anchor() {
    let engine = build_engine(
        Arc::new(EchoOcr::english()),
        Arc::new(PassthroughTranslator),
        Arc::new(KeywordClassifier),
        Some(Arc::new(OfflineLedger)),
    )
    .await;

    let outcome = engine
        .verify(request(HAPPY_DOC, Some("PRT-offline"), true))
        .await
        .unwrap();

    assert!(outcome.record.anchor_reference.is_none());
    assert!(outcome.record.anchor_block_height.is_none());

    // The relational record is still queryable.
    let (stored, _) = db::verifications::get_latest(engine.db(), "PRT-offline")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.fingerprint, outcome.record.fingerprint);
    assert!(stored.anchor_reference.is_none());

    // The failure is on the audit trail.
    let failures = db::audit::by_operation(engine.db(), AuditOperation::LedgerFailure)
        .await
        .unwrap();
    assert!(!failures.is_empty());
    assert_eq!(failures[0].status, AuditStatus::Failure);
}

#[tokio::test]
async fn failed_translation_degrades_with_warning() {
    let engine = build_engine(
        Arc::new(EchoOcr::kannada()),
        Arc::new(FailingTranslator),
        Arc::new(KeywordClassifier),
        None,
    )
    .await;

    let outcome = engine.verify(request(HAPPY_DOC, None, false)).await.unwrap();
    assert!(outcome
        .detail
        .warnings
        .iter()
        .any(|w| w == "translation_unavailable"));
    // The pipeline still extracted from the original text.
    assert_eq!(outcome.detail.entities.owner.as_deref(), Some("RAVI KUMAR"));
}

#[tokio::test]
async fn extraction_failure_persists_nothing() {
    let engine = build_engine(
        Arc::new(FailingOcr),
        Arc::new(PassthroughTranslator),
        Arc::new(KeywordClassifier),
        None,
    )
    .await;

    let err = engine
        .verify(request(HAPPY_DOC, Some("PRT-fail"), false))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "EXTERNAL_UNAVAILABLE");

    assert!(db::verifications::get_latest(engine.db(), "PRT-fail")
        .await
        .unwrap()
        .is_none());

    // The failure itself is audited.
    let audits = db::audit::by_operation(engine.db(), AuditOperation::Verify)
        .await
        .unwrap();
    assert!(audits
        .iter()
        .any(|a| a.status == AuditStatus::Failure && a.property_id.as_deref() == Some("PRT-fail")));
}

#[tokio::test]
async fn empty_extraction_still_produces_record_with_data_quality_factor() {
    let engine = default_engine().await;
    // Whitespace-only document: extraction succeeds with empty text.
    let outcome = engine.verify(request("   ", None, false)).await.unwrap();

    assert!(outcome
        .detail
        .risk_factors
        .iter()
        .any(|f| f.code == "data_quality_low"));
    // owner_missing and survey_missing fire too.
    assert_eq!(outcome.record.risk_score, 40);
    assert_eq!(outcome.record.risk_level, RiskLevel::Medium);
}

#[tokio::test]
async fn cancelled_before_pipeline_persists_nothing() {
    let engine = default_engine().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine
        .verify(VerifyRequest {
            document_bytes: HAPPY_DOC.as_bytes().to_vec(),
            declared_type: DocumentType::Rtc,
            property_id: Some("PRT-cancel".to_string()),
            anchor: false,
            cancel,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CANCELLED");

    assert!(db::verifications::get_latest(engine.db(), "PRT-cancel")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn empty_document_is_bad_input() {
    let engine = default_engine().await;
    let err = engine.verify(request("", None, false)).await.unwrap_err();
    assert_eq!(err.code(), "BAD_INPUT");
}

#[tokio::test]
async fn cascade_delete_removes_rows_but_not_ledger() {
    let engine = default_engine().await;
    let outcome = engine
        .verify(request(HAPPY_DOC, Some("PRT-del"), true))
        .await
        .unwrap();
    engine
        .check_tamper("PRT-del", HAPPY_DOC.as_bytes(), CancellationToken::new())
        .await
        .unwrap();

    assert!(engine.delete_property("PRT-del").await.unwrap());

    assert!(db::verifications::get_latest(engine.db(), "PRT-del")
        .await
        .unwrap()
        .is_none());
    assert!(db::properties::get_property(engine.db(), "PRT-del")
        .await
        .unwrap()
        .is_none());
    assert!(db::tamper_checks::get_tamper_checks(engine.db(), "PRT-del")
        .await
        .unwrap()
        .is_empty());

    // The ledger entry survives the delete.
    let anchored = engine.ledger().get("PRT-del").await.unwrap().unwrap();
    assert_eq!(anchored.fingerprint, outcome.record.fingerprint);

    // Deleting again reports absence.
    assert!(!engine.delete_property("PRT-del").await.unwrap());

    // The delete is audited.
    let audits = db::audit::by_operation(engine.db(), AuditOperation::Delete)
        .await
        .unwrap();
    assert_eq!(audits.len(), 1);
}

#[tokio::test]
async fn verification_history_is_newest_first() {
    let engine = default_engine().await;
    engine
        .verify(request(HAPPY_DOC, Some("PRT-multi"), false))
        .await
        .unwrap();
    engine
        .verify(request(LOAN_DOC, Some("PRT-multi"), false))
        .await
        .unwrap();

    let history = db::verifications::get_history(engine.db(), "PRT-multi")
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);
    assert_eq!(history[0].risk_score, 30);
    assert_eq!(history[1].risk_score, 0);
}

#[tokio::test]
async fn classification_label_recorded_with_confidence() {
    let engine = build_engine(
        Arc::new(EchoOcr::english()),
        Arc::new(PassthroughTranslator),
        Arc::new(FixedClassifier(Classification {
            label: ClassLabel::LoanDetected,
            confidence: 0.3,
        })),
        None,
    )
    .await;

    // Below the floor: the label collapses to UNKNOWN in the record.
    let outcome = engine.verify(request(LOAN_DOC, None, false)).await.unwrap();
    assert_eq!(outcome.record.classification_label, ClassLabel::Unknown);
    assert!((outcome.record.classification_confidence - 0.3).abs() < f64::EPSILON);
}
