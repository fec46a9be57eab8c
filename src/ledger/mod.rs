//! Ledger service client.
//!
//! Two calls cover everything the fee collector needs:
//!
//! 1. `prepare_withdrawal` - the ledger-side preparation service builds the
//!    unsigned withdrawal transaction for an agent's gas reserve and returns
//!    it together with the agent's own signature over those bytes.
//! 2. `submit` - submits the transaction with its attached signatures,
//!    waiting for finality and full effect reporting.
//!
//! Timeouts and finality semantics are the ledger service's; tollgate adds no
//! retry policy of its own beyond the next scheduled cycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::types::{Result, TollgateError};

/// Parameters for preparing one agent's fee withdrawal
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalRequest {
    /// Agent whose gas reserve is debited
    pub agent_id: String,
    /// Fee amount in the smallest ledger unit
    pub amount: u64,
    /// On-chain object reference for the agent's gas reserve
    pub object_ref: String,
    /// Destination address for the collected fee
    pub destination: String,
}

/// Unsigned transaction plus the agent's signature over it
#[derive(Debug, Clone, Deserialize)]
pub struct PreparedWithdrawal {
    /// Unsigned transaction bytes; both signatures must cover exactly these
    pub tx_bytes: Vec<u8>,
    /// Agent signature over `tx_bytes`, produced by the preparation service
    pub agent_signature: Vec<u8>,
}

/// Finality outcome of a submission
#[derive(Debug, Clone, Deserialize)]
pub struct FinalityResult {
    /// "success" or "failure"
    pub status: String,
    /// Ledger-reported detail on failure
    #[serde(default)]
    pub error_detail: Option<String>,
}

impl FinalityResult {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Narrow contract against the ledger service
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Build the unsigned withdrawal transaction and the agent's signature.
    async fn prepare_withdrawal(&self, request: &WithdrawalRequest) -> Result<PreparedWithdrawal>;

    /// Submit a transaction with all attached signatures, waiting for
    /// finality.
    async fn submit(&self, tx_bytes: &[u8], signatures: &[Vec<u8>]) -> Result<FinalityResult>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    tx_bytes: &'a [u8],
    signatures: &'a [Vec<u8>],
}

/// HTTP client for the ledger service.
///
/// Contract: `POST {base}/withdrawals/prepare` with a `WithdrawalRequest`
/// body returns a `PreparedWithdrawal`; `POST {base}/transactions/submit`
/// with tx bytes + signatures returns a `FinalityResult`.
pub struct HttpLedgerClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn prepare_withdrawal(&self, request: &WithdrawalRequest) -> Result<PreparedWithdrawal> {
        let response = self
            .client
            .post(format!("{}/withdrawals/prepare", self.base_url))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| TollgateError::Preparation(format!("prepare request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TollgateError::Preparation(format!(
                "prepare rejected ({status}): {detail}"
            )));
        }

        let prepared: PreparedWithdrawal = response
            .json()
            .await
            .map_err(|e| TollgateError::Preparation(format!("invalid prepare response: {e}")))?;

        debug!(
            agent = %request.agent_id,
            tx_len = prepared.tx_bytes.len(),
            "Withdrawal prepared"
        );

        Ok(prepared)
    }

    async fn submit(&self, tx_bytes: &[u8], signatures: &[Vec<u8>]) -> Result<FinalityResult> {
        let response = self
            .client
            .post(format!("{}/transactions/submit", self.base_url))
            .timeout(self.timeout)
            .json(&SubmitRequest {
                tx_bytes,
                signatures,
            })
            .send()
            .await
            .map_err(|e| TollgateError::Submission(format!("submit request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TollgateError::Submission(format!(
                "submit rejected ({status}): {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TollgateError::Submission(format!("invalid submit response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finality_success_flag() {
        let ok = FinalityResult {
            status: "success".into(),
            error_detail: None,
        };
        assert!(ok.is_success());

        let failed = FinalityResult {
            status: "failure".into(),
            error_detail: Some("insufficient gas reserve".into()),
        };
        assert!(!failed.is_success());
    }

    #[test]
    fn test_finality_deserializes_without_detail() {
        let result: FinalityResult = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(result.is_success());
        assert!(result.error_detail.is_none());
    }
}
