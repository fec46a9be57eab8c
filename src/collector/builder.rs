//! Co-signing withdrawal builder.
//!
//! Produces and submits one dual-signature fee withdrawal: the preparation
//! service returns the unsigned transaction together with the agent's
//! signature, the sponsor signs the same bytes, and both signatures travel
//! with the submission. The ledger rejects the transaction unless both
//! signatures cover byte-identical content, so the prepared `tx_bytes`
//! buffer is the single source for signing and submission alike.
//!
//! The agent's own encrypted key is never touched on this path - the
//! preparation service is the sole producer of the agent signature.

use std::sync::Arc;
use tracing::debug;

use crate::db::schemas::AgentDoc;
use crate::keys::SponsorIdentity;
use crate::ledger::{LedgerClient, WithdrawalRequest};
use crate::types::{Result, TollgateError};

/// Ed25519 signature length
const SIGNATURE_LEN: usize = 64;

/// Builds and submits sponsored withdrawals for single agents
pub struct CoSigner {
    ledger: Arc<dyn LedgerClient>,
    sponsor: Arc<SponsorIdentity>,
}

impl CoSigner {
    pub fn new(ledger: Arc<dyn LedgerClient>, sponsor: Arc<SponsorIdentity>) -> Self {
        Self { ledger, sponsor }
    }

    /// Withdraw `fee_amount` from one agent's gas reserve to `destination`.
    ///
    /// Success is silent. Failures surface as `Preparation`, `Signing`, or
    /// `Submission` errors, all recoverable at the cycle level.
    pub async fn collect(
        &self,
        agent: &AgentDoc,
        fee_amount: u64,
        destination: &str,
    ) -> Result<()> {
        let object_ref = agent.ledger_object_id.as_deref().ok_or_else(|| {
            TollgateError::Preparation(format!("agent {} has no ledger object", agent.agent_id))
        })?;

        let prepared = self
            .ledger
            .prepare_withdrawal(&WithdrawalRequest {
                agent_id: agent.agent_id.clone(),
                amount: fee_amount,
                object_ref: object_ref.to_string(),
                destination: destination.to_string(),
            })
            .await?;

        if prepared.agent_signature.len() != SIGNATURE_LEN {
            return Err(TollgateError::Signing(format!(
                "agent signature has invalid length {} (expected {})",
                prepared.agent_signature.len(),
                SIGNATURE_LEN
            )));
        }

        // Second signature over exactly the prepared bytes
        let sponsor_signature = self.sponsor.sign(&prepared.tx_bytes);

        debug!(
            agent = %agent.agent_id,
            amount = fee_amount,
            tx_len = prepared.tx_bytes.len(),
            "Submitting co-signed withdrawal"
        );

        let finality = self
            .ledger
            .submit(
                &prepared.tx_bytes,
                &[prepared.agent_signature, sponsor_signature],
            )
            .await?;

        if !finality.is_success() {
            return Err(TollgateError::Submission(
                finality
                    .error_detail
                    .unwrap_or_else(|| "ledger reported failure without detail".to_string()),
            ));
        }

        Ok(())
    }
}
