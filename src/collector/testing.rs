//! Scripted ledger double shared by the collector tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::keys::SponsorIdentity;
use crate::ledger::{FinalityResult, LedgerClient, PreparedWithdrawal, WithdrawalRequest};
use crate::types::{Result, TollgateError};

/// A recorded call to [`LedgerClient::submit`]
#[derive(Clone)]
pub struct Submission {
    pub tx_bytes: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

/// In-process ledger that prepares deterministic transactions, signs them
/// with a single test agent key, and records every submission. Failure
/// injection covers the three error surfaces a cycle has to tolerate.
pub struct ScriptedLedger {
    agent_key: SigningKey,
    submissions: Mutex<Vec<Submission>>,
    prepare_calls: AtomicU32,
    fail_prepare: Mutex<HashSet<String>>,
    fail_finality: Mutex<Option<String>>,
    truncate_signature: AtomicBool,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            agent_key: SigningKey::generate(&mut OsRng),
            submissions: Mutex::new(Vec::new()),
            prepare_calls: AtomicU32::new(0),
            fail_prepare: Mutex::new(HashSet::new()),
            fail_finality: Mutex::new(None),
            truncate_signature: AtomicBool::new(false),
        }
    }

    /// Fail `prepare_withdrawal` for one agent id
    pub fn fail_prepare_for(&self, agent_id: &str) {
        self.fail_prepare
            .lock()
            .unwrap()
            .insert(agent_id.to_string());
    }

    /// Make every submission finalize as a failure with this detail
    pub fn fail_finality(&self, detail: &str) {
        *self.fail_finality.lock().unwrap() = Some(detail.to_string());
    }

    /// Return agent signatures one byte short
    pub fn truncate_agent_signature(&self) {
        self.truncate_signature.store(true, Ordering::SeqCst);
    }

    pub fn agent_verifying_key(&self) -> VerifyingKey {
        self.agent_key.verifying_key()
    }

    pub fn prepare_calls(&self) -> u32 {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn last_submission(&self) -> Option<Submission> {
        self.submissions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn prepare_withdrawal(&self, request: &WithdrawalRequest) -> Result<PreparedWithdrawal> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_prepare.lock().unwrap().contains(&request.agent_id) {
            return Err(TollgateError::Preparation(format!(
                "scripted failure for {}",
                request.agent_id
            )));
        }

        let tx_bytes = serde_json::to_vec(request)
            .map_err(|e| TollgateError::Preparation(e.to_string()))?;
        let mut agent_signature = self.agent_key.sign(&tx_bytes).to_bytes().to_vec();
        if self.truncate_signature.load(Ordering::SeqCst) {
            agent_signature.pop();
        }

        Ok(PreparedWithdrawal {
            tx_bytes,
            agent_signature,
        })
    }

    async fn submit(&self, tx_bytes: &[u8], signatures: &[Vec<u8>]) -> Result<FinalityResult> {
        self.submissions.lock().unwrap().push(Submission {
            tx_bytes: tx_bytes.to_vec(),
            signatures: signatures.to_vec(),
        });

        Ok(match self.fail_finality.lock().unwrap().clone() {
            Some(detail) => FinalityResult {
                status: "failed".to_string(),
                error_detail: Some(detail),
            },
            None => FinalityResult {
                status: "success".to_string(),
                error_detail: None,
            },
        })
    }
}

/// Sponsor identity backed by a fresh random keypair
pub fn test_sponsor() -> SponsorIdentity {
    SponsorIdentity::from_signing_key(SigningKey::generate(&mut OsRng))
}
