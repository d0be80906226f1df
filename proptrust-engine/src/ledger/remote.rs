//! Remote chain client
//!
//! Maps a remote ledger service onto the unified `Ledger` contract. The
//! wire shapes are the service's; everything is converted to the same types
//! the local backend returns, so the engine cannot tell the backends apart.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proptrust_common::types::Fingerprint;
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerEntry, LedgerError, LedgerReceipt, LedgerResult, LedgerStatus};

pub struct RemoteLedger {
    http_client: reqwest::Client,
    endpoint: String,
    identity: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    property_id: &'a str,
    fingerprint_hex: String,
    risk_score: u8,
    verifier_identity: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    reference: String,
    block_height: i64,
    ledger_timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    property_id: String,
    fingerprint_hex: String,
    risk_score: u8,
    block_height: i64,
    ledger_timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    fingerprints_hex: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    connected: bool,
    #[serde(default)]
    latest_block_height: Option<i64>,
}

impl RemoteLedger {
    pub fn new(endpoint: String, identity: String, timeout: Duration) -> LedgerResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(Self {
            http_client,
            endpoint,
            identity,
        })
    }

    fn transport_err(e: reqwest::Error) -> LedgerError {
        LedgerError::Unavailable(e.to_string())
    }

    async fn rejection(response: reqwest::Response) -> LedgerError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        LedgerError::Rejected(format!("ledger returned {status}: {body}"))
    }
}

#[async_trait]
impl Ledger for RemoteLedger {
    async fn put(
        &self,
        property_id: &str,
        fingerprint: &Fingerprint,
        risk_score: u8,
    ) -> LedgerResult<LedgerReceipt> {
        let response = self
            .http_client
            .post(format!("{}/entries", self.endpoint))
            .header("x-verifier-identity", &self.identity)
            .json(&PutRequest {
                property_id,
                fingerprint_hex: fingerprint.to_hex(),
                risk_score,
                verifier_identity: &self.identity,
            })
            .send()
            .await
            .map_err(Self::transport_err)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let parsed: PutResponse = response.json().await.map_err(Self::transport_err)?;
        Ok(LedgerReceipt {
            reference: parsed.reference,
            block_height: parsed.block_height,
            ledger_timestamp: parsed.ledger_timestamp,
        })
    }

    async fn get(&self, property_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        let response = self
            .http_client
            .get(format!("{}/entries/{}", self.endpoint, property_id))
            .header("x-verifier-identity", &self.identity)
            .send()
            .await
            .map_err(Self::transport_err)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let parsed: GetResponse = response.json().await.map_err(Self::transport_err)?;
        let fingerprint = Fingerprint::from_hex(&parsed.fingerprint_hex)
            .map_err(|e| LedgerError::Rejected(format!("malformed fingerprint: {e}")))?;
        Ok(Some(LedgerEntry {
            property_id: parsed.property_id,
            fingerprint,
            risk_score: parsed.risk_score,
            block_height: parsed.block_height,
            ledger_timestamp: parsed.ledger_timestamp,
        }))
    }

    async fn history(&self, property_id: &str) -> LedgerResult<Vec<Fingerprint>> {
        let response = self
            .http_client
            .get(format!("{}/entries/{}/history", self.endpoint, property_id))
            .header("x-verifier-identity", &self.identity)
            .send()
            .await
            .map_err(Self::transport_err)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let parsed: HistoryResponse = response.json().await.map_err(Self::transport_err)?;
        parsed
            .fingerprints_hex
            .iter()
            .map(|hex| {
                Fingerprint::from_hex(hex)
                    .map_err(|e| LedgerError::Rejected(format!("malformed fingerprint: {e}")))
            })
            .collect()
    }

    async fn status(&self) -> LedgerStatus {
        let result = self
            .http_client
            .get(format!("{}/status", self.endpoint))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<StatusResponse>().await {
                    Ok(parsed) => LedgerStatus {
                        connected: parsed.connected,
                        backend: "remote".to_string(),
                        latest_block_height: parsed.latest_block_height,
                    },
                    Err(_) => LedgerStatus {
                        connected: false,
                        backend: "remote".to_string(),
                        latest_block_height: None,
                    },
                }
            }
            _ => LedgerStatus {
                connected: false,
                backend: "remote".to_string(),
                latest_block_height: None,
            },
        }
    }
}
