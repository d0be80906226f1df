//! Tamper checking
//!
//! Re-runs the verification pipeline on a fresh upload and contrasts the
//! recomputed fingerprint with the one anchored on the ledger. Read-only
//! with respect to the ledger; results and warnings are persisted as
//! TamperCheck rows.

use std::collections::HashSet;

use proptrust_common::error::{Error, Result, Stage};
use tokio_util::sync::CancellationToken;

use crate::db;
use crate::ledger::LedgerError;
use crate::models::{
    AuditOperation, AuditStatus, Classification, TamperCheck, TamperStatus,
};
use crate::services::{self, fingerprint::CanonicalInput};

use super::VerificationEngine;

impl VerificationEngine {
    /// Re-verify an upload against the anchored fingerprint for a property.
    pub async fn check_tamper(
        &self,
        property_id: &str,
        document_bytes: &[u8],
        cancel: CancellationToken,
    ) -> Result<TamperCheck> {
        match self.check_tamper_inner(property_id, document_bytes, cancel).await {
            Ok(check) => {
                self.audit(
                    AuditOperation::TamperCheck,
                    Some(property_id),
                    AuditStatus::Success,
                    &format!("tamper check {} -> {}", check.tamper_check_id, check.status),
                )
                .await;
                Ok(check)
            }
            Err(err) => {
                self.audit(
                    AuditOperation::TamperCheck,
                    Some(property_id),
                    AuditStatus::Failure,
                    &format!("{}: {}", err.code(), err),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn check_tamper_inner(
        &self,
        property_id: &str,
        document_bytes: &[u8],
        cancel: CancellationToken,
    ) -> Result<TamperCheck> {
        let anchored = tokio::time::timeout(
            self.config.ledger_timeout,
            self.ledger.get(property_id),
        )
        .await
        .map_err(|_| Error::DeadlineExceeded {
            stage: Stage::Ledger,
            timeout_ms: self.config.ledger_timeout.as_millis() as u64,
        })?
        .map_err(ledger_to_engine_error)?;

        // NotFound is a result, not an error: the check is persisted so the
        // attempt itself is on record.
        let anchored = match anchored {
            Some(entry) => entry,
            None => {
                let check = TamperCheck {
                    tamper_check_id: self.ids.tamper_check_id(),
                    property_id: property_id.to_string(),
                    anchored_fingerprint: None,
                    recomputed_fingerprint: None,
                    hash_matched: false,
                    risk_score_delta: 0,
                    status: TamperStatus::NotFound,
                    warnings: vec![
                        "property has never been anchored to the ledger".to_string(),
                    ],
                    created_at: self.clock.now(),
                };
                db::tamper_checks::insert_tamper_check(&self.db, &check).await?;
                tracing::info!(property_id = %property_id, "tamper check: property not found on ledger");
                return Ok(check);
            }
        };

        if document_bytes.is_empty() {
            return Err(Error::BadInput("document is empty".into()));
        }

        let run = self
            .run_pipeline(property_id, document_bytes, &cancel)
            .await?;

        let hash_matched = run.fingerprint == anchored.fingerprint;
        let risk_score_delta = run.assessment.score as i32 - anchored.risk_score as i32;
        let mut warnings = run.warnings.clone();

        match db::verifications::get_latest(&self.db, property_id).await? {
            Some((prev_record, prev_detail)) => {
                if !hash_matched {
                    let prev_classification = Classification {
                        label: prev_record.classification_label,
                        confidence: prev_record.classification_confidence,
                    };
                    let prev_canonical = CanonicalInput {
                        property_id,
                        entities: &prev_detail.entities,
                        risk_score: prev_record.risk_score,
                        classification: &prev_classification,
                        classification_floor: self.config.classifier_confidence_floor,
                    };

                    // If only the risk score moved, the comparison projection
                    // of old and new records still agrees. Any canonical-field
                    // difference is tampering either way; the warning narrows
                    // the diagnosis.
                    if services::comparison_fingerprint(&prev_canonical)
                        == run.comparison_fingerprint
                    {
                        warnings.push("RISK_SCORE_CHANGED".to_string());
                    }

                    let new_canonical = CanonicalInput {
                        property_id,
                        entities: &run.entities,
                        risk_score: run.assessment.score,
                        classification: &run.classification,
                        classification_floor: self.config.classifier_confidence_floor,
                    };
                    warnings.extend(canonical_field_diff(
                        &services::fingerprint::canonical_fields(&prev_canonical),
                        &services::fingerprint::canonical_fields(&new_canonical),
                    ));
                }

                let prev_codes: HashSet<String> = prev_detail
                    .risk_factors
                    .iter()
                    .map(|f| f.code.clone())
                    .collect();
                let new_codes: HashSet<String> =
                    run.assessment.factor_codes().into_iter().collect();
                for code in new_codes.difference(&prev_codes) {
                    warnings.push(format!("factor_added:{code}"));
                }
                for code in prev_codes.difference(&new_codes) {
                    warnings.push(format!("factor_removed:{code}"));
                }
            }
            None => {
                warnings.push(
                    "no persisted verification available for factor comparison".to_string(),
                );
            }
        }

        warnings.sort();
        warnings.dedup();

        let status = if hash_matched {
            TamperStatus::Verified
        } else {
            TamperStatus::Tampered
        };

        let check = TamperCheck {
            tamper_check_id: self.ids.tamper_check_id(),
            property_id: property_id.to_string(),
            anchored_fingerprint: Some(anchored.fingerprint),
            recomputed_fingerprint: Some(run.fingerprint),
            hash_matched,
            risk_score_delta,
            status,
            warnings,
            created_at: self.clock.now(),
        };

        db::tamper_checks::insert_tamper_check(&self.db, &check).await?;

        tracing::info!(
            property_id = %property_id,
            status = %check.status,
            hash_matched,
            risk_score_delta,
            "tamper check complete"
        );

        Ok(check)
    }
}

/// Names of top-level canonical fields whose values differ between the
/// anchored and recomputed projections.
fn canonical_field_diff(prev: &serde_json::Value, new: &serde_json::Value) -> Vec<String> {
    let (prev_map, new_map) = match (prev.as_object(), new.as_object()) {
        (Some(p), Some(n)) => (p, n),
        _ => return Vec::new(),
    };
    prev_map
        .iter()
        .filter(|(key, value)| new_map.get(*key) != Some(value))
        .map(|(key, _)| format!("field_changed:{key}"))
        .collect()
}

fn ledger_to_engine_error(err: LedgerError) -> Error {
    match err {
        LedgerError::Unavailable(message) => Error::ExternalUnavailable {
            stage: Stage::Ledger,
            message,
        },
        LedgerError::Rejected(message) => Error::LedgerRejected(message),
    }
}
