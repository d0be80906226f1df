//! Verification orchestration
//!
//! Drives the pipeline: extraction, normalization, translation, entity
//! extraction and classification (concurrent), risk scoring, fingerprinting,
//! atomic persistence, then optional ledger anchoring. Anchoring failure
//! degrades to null anchor fields after persistence; every other stage
//! failure surfaces as a typed error with nothing persisted.

use proptrust_common::error::{Error, Result, Stage};
use proptrust_common::types::{DocumentType, Fingerprint};
use tokio_util::sync::CancellationToken;

use crate::db;
use crate::models::{
    AuditOperation, AuditStatus, Classification, DocumentFormat, EntityBundle, NormalizedText,
    Property, RiskAssessment, VerificationDetail, VerificationRecord,
};
use crate::services::{self, fingerprint::CanonicalInput, risk_scorer::RiskInput};

use super::VerificationEngine;

/// Bounded length of the cleaned-text preview persisted with the detail.
const PREVIEW_MAX_CHARS: usize = 2000;

/// One verification request.
pub struct VerifyRequest {
    pub document_bytes: Vec<u8>,
    pub declared_type: DocumentType,
    /// Supplied on re-verification of a known parcel; allocated otherwise.
    pub property_id: Option<String>,
    /// Whether to anchor the fingerprint on the ledger after persistence.
    pub anchor: bool,
    pub cancel: CancellationToken,
}

/// Result of a successful verification.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub property: Property,
    pub record: VerificationRecord,
    pub detail: VerificationDetail,
}

/// Everything one pipeline pass produces, shared between `verify` and
/// `check_tamper`.
pub(crate) struct PipelineRun {
    pub pages_processed: u32,
    pub chars_original: usize,
    pub normalized: NormalizedText,
    pub entities: EntityBundle,
    /// Post-floor classification.
    pub classification: Classification,
    pub assessment: RiskAssessment,
    pub fingerprint: Fingerprint,
    pub comparison_fingerprint: Fingerprint,
    pub warnings: Vec<String>,
}

impl VerificationEngine {
    /// Verify a document, persist the result, and optionally anchor it.
    ///
    /// Identical bytes and declared type produce identical detail and
    /// fingerprint; each call appends a fresh VerificationRecord under a new
    /// verification id.
    pub async fn verify(&self, request: VerifyRequest) -> Result<VerificationOutcome> {
        let property_id = request
            .property_id
            .clone()
            .unwrap_or_else(|| self.ids.property_id());

        match self.verify_inner(&property_id, &request).await {
            Ok(outcome) => {
                self.audit(
                    AuditOperation::Verify,
                    Some(&property_id),
                    AuditStatus::Success,
                    &format!(
                        "verification {} completed with risk {} ({})",
                        outcome.record.verification_id,
                        outcome.record.risk_score,
                        outcome.record.risk_level
                    ),
                )
                .await;
                Ok(outcome)
            }
            Err(err) => {
                self.audit(
                    AuditOperation::Verify,
                    Some(&property_id),
                    AuditStatus::Failure,
                    &format!("{}: {}", err.code(), err),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn verify_inner(
        &self,
        property_id: &str,
        request: &VerifyRequest,
    ) -> Result<VerificationOutcome> {
        if request.document_bytes.is_empty() {
            return Err(Error::BadInput("document is empty".into()));
        }

        let verification_id = self.ids.verification_id();
        tracing::info!(
            property_id = %property_id,
            verification_id = %verification_id,
            document_type = %request.declared_type,
            anchor = request.anchor,
            "Starting verification pipeline"
        );

        let run = self
            .run_pipeline(property_id, &request.document_bytes, &request.cancel)
            .await?;

        let now = self.clock.now();
        let property = Property {
            property_id: property_id.to_string(),
            document_type: request.declared_type,
            created_at: now,
            owner_name: run.entities.owner.clone(),
            survey_number: run.entities.survey_number.clone(),
        };
        let mut record = VerificationRecord {
            verification_id: verification_id.clone(),
            property_id: property_id.to_string(),
            risk_score: run.assessment.score,
            risk_level: run.assessment.level,
            classification_label: run.classification.label,
            classification_confidence: run.classification.confidence,
            fingerprint: run.fingerprint,
            anchor_reference: None,
            anchor_block_height: None,
            anchor_timestamp: None,
            created_at: now,
        };
        let detail = VerificationDetail {
            verification_id: verification_id.clone(),
            entities: run.entities,
            cleaned_text_preview: preview(&run.normalized.text),
            pages_processed: run.pages_processed,
            chars_original: run.chars_original,
            chars_cleaned: run.normalized.chars_cleaned,
            risk_factors: run.assessment.factors.clone(),
            recommendations: run.assessment.recommendations.clone(),
            warnings: run.warnings,
        };

        if request.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        db::verifications::insert_verification(&self.db, &property, &record, &detail).await?;

        if request.anchor {
            self.anchor_record(&mut record, &request.cancel).await;
        }

        Ok(VerificationOutcome {
            property,
            record,
            detail,
        })
    }

    /// Anchor a persisted record. Failure is degraded, never fatal: the
    /// record keeps null anchor fields and the audit trail records why.
    async fn anchor_record(&self, record: &mut VerificationRecord, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            self.audit(
                AuditOperation::LedgerFailure,
                Some(&record.property_id),
                AuditStatus::Failure,
                "cancelled before anchoring; record persisted without anchor",
            )
            .await;
            return;
        }

        let put = tokio::time::timeout(
            self.config.ledger_timeout,
            self.ledger
                .put(&record.property_id, &record.fingerprint, record.risk_score),
        )
        .await;

        match put {
            Ok(Ok(receipt)) => {
                let updated = db::verifications::set_anchor(
                    &self.db,
                    &record.verification_id,
                    &receipt.reference,
                    receipt.block_height,
                    receipt.ledger_timestamp,
                )
                .await;
                match updated {
                    Ok(()) => {
                        record.anchor_reference = Some(receipt.reference.clone());
                        record.anchor_block_height = Some(receipt.block_height);
                        record.anchor_timestamp = Some(receipt.ledger_timestamp);
                        self.audit(
                            AuditOperation::LedgerAnchor,
                            Some(&record.property_id),
                            AuditStatus::Success,
                            &format!(
                                "fingerprint anchored at block {} ({})",
                                receipt.block_height, receipt.reference
                            ),
                        )
                        .await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            property_id = %record.property_id,
                            error = %e,
                            "anchor confirmed on ledger but record update failed"
                        );
                        self.audit(
                            AuditOperation::LedgerFailure,
                            Some(&record.property_id),
                            AuditStatus::Failure,
                            &format!("anchor update failed after ledger put: {e}"),
                        )
                        .await;
                    }
                }
            }
            Ok(Err(ledger_err)) => {
                tracing::warn!(
                    property_id = %record.property_id,
                    error = %ledger_err,
                    "ledger anchoring failed; record persisted without anchor"
                );
                self.audit(
                    AuditOperation::LedgerFailure,
                    Some(&record.property_id),
                    AuditStatus::Failure,
                    &ledger_err.to_string(),
                )
                .await;
            }
            Err(_) => {
                tracing::warn!(
                    property_id = %record.property_id,
                    timeout_ms = self.config.ledger_timeout.as_millis() as u64,
                    "ledger anchoring timed out; record persisted without anchor"
                );
                self.audit(
                    AuditOperation::LedgerFailure,
                    Some(&record.property_id),
                    AuditStatus::Failure,
                    &format!(
                        "ledger put exceeded {} ms deadline",
                        self.config.ledger_timeout.as_millis()
                    ),
                )
                .await;
            }
        }
    }

    /// Run extraction through fingerprinting. Shared by `verify` and
    /// `check_tamper`; performs no persistence and no ledger writes.
    pub(crate) async fn run_pipeline(
        &self,
        property_id: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<PipelineRun> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let format = DocumentFormat::sniff(bytes).unwrap_or(DocumentFormat::Image);
        let extraction = tokio::time::timeout(
            self.config.extraction_timeout,
            self.extractor.extract(bytes, format),
        )
        .await
        .map_err(|_| Error::DeadlineExceeded {
            stage: Stage::Extraction,
            timeout_ms: self.config.extraction_timeout.as_millis() as u64,
        })??;

        if extraction.is_empty() {
            tracing::warn!(property_id = %property_id, "extraction produced no text");
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let raw_text = extraction.joined_text();
        let normalized = services::normalize(&raw_text);

        let mut warnings: Vec<String> = Vec::new();

        let needs_translation = extraction
            .language_hint
            .as_deref()
            .map(|hint| !hint.eq_ignore_ascii_case("en"))
            .unwrap_or(false);
        let working_text = if needs_translation && !normalized.text.is_empty() {
            match tokio::time::timeout(
                self.config.translation_timeout,
                self.translator.translate(&normalized.text),
            )
            .await
            {
                Ok(Ok(translated)) => translated,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "translation failed; using original text");
                    warnings.push("translation_unavailable".to_string());
                    normalized.text.clone()
                }
                Err(_) => {
                    tracing::warn!("translation timed out; using original text");
                    warnings.push("translation_unavailable".to_string());
                    normalized.text.clone()
                }
            }
        } else {
            normalized.text.clone()
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Entity extraction and classification are both pure functions of the
        // working text, so they run concurrently.
        let span_task = async {
            match self.ner.spans(&working_text).await {
                Ok(spans) => (spans, None),
                Err(e) => {
                    tracing::warn!(error = %e, "NER model unavailable; rule layer stands alone");
                    (Vec::new(), Some("ner_unavailable".to_string()))
                }
            }
        };
        let classify_task = async {
            match tokio::time::timeout(
                self.config.classifier_timeout,
                self.classifier.classify(&working_text),
            )
            .await
            {
                Ok(Ok(classification)) => (classification, None),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "classifier failed; label collapses to UNKNOWN");
                    (
                        Classification::unknown(),
                        Some("classification_unavailable".to_string()),
                    )
                }
                Err(_) => {
                    tracing::warn!("classifier timed out; label collapses to UNKNOWN");
                    (
                        Classification::unknown(),
                        Some("classification_unavailable".to_string()),
                    )
                }
            }
        };
        let ((spans, ner_warning), (classification, classifier_warning)) =
            tokio::join!(span_task, classify_task);
        warnings.extend(ner_warning);
        warnings.extend(classifier_warning);

        let entities = self.entity_extractor.extract(&working_text, &spans);
        let classification = classification.floored(self.config.classifier_confidence_floor);

        let assessment = services::score(&RiskInput {
            entities: &entities,
            classification: &classification,
            chars_cleaned: normalized.chars_cleaned,
            chars_floor: self.config.data_quality_chars_floor,
            today: self.clock.today(),
        });

        let canonical = CanonicalInput {
            property_id,
            entities: &entities,
            risk_score: assessment.score,
            classification: &classification,
            classification_floor: self.config.classifier_confidence_floor,
        };
        let fingerprint = services::fingerprint(&canonical);
        let comparison_fingerprint = services::comparison_fingerprint(&canonical);

        tracing::debug!(
            property_id = %property_id,
            risk_score = assessment.score,
            fingerprint = %fingerprint,
            "pipeline pass complete"
        );

        Ok(PipelineRun {
            pages_processed: extraction.pages_processed,
            chars_original: extraction.chars_original,
            normalized,
            entities,
            classification,
            assessment,
            fingerprint,
            comparison_fingerprint,
            warnings,
        })
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_MAX_CHARS).collect()
}
