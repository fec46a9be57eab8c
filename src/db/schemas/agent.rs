//! Agent document schema
//!
//! One document per on-chain agent. Provisioning and lifecycle transitions
//! happen outside this service; tollgate only reads these documents when
//! building fee-collection batches.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for agents
pub const AGENT_COLLECTION: &str = "agents";

/// Agent lifecycle status; only active agents participate in fee collection
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    #[default]
    Inactive,
}

/// Encrypted signing-key material for an agent.
///
/// Same envelope the sponsor key uses: Argon2id-derived KEK,
/// ChaCha20-Poly1305 ciphertext, per-key salt and nonce, all base64.
/// The fee-collection path never decrypts this - the ledger's
/// withdrawal-preparation service supplies the agent signature.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct KeyMaterial {
    /// Ed25519 public key (base64)
    pub public_key: String,

    /// Encrypted private key (base64) - ciphertext + auth tag
    pub encrypted_private_key: String,

    /// Key derivation salt (base64)
    pub key_derivation_salt: String,

    /// Encryption nonce (base64)
    pub encryption_nonce: String,

    /// Key format version (for forward compatibility)
    #[serde(default = "default_key_version")]
    pub key_version: u32,
}

fn default_key_version() -> u32 {
    1
}

/// Agent document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AgentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque agent identifier
    pub agent_id: String,

    /// On-chain wallet address
    pub wallet_address: String,

    /// Encrypted signing-key material; absent until provisioning completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_material: Option<KeyMaterial>,

    /// On-chain object reference for the agent's gas reserve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_object_id: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: AgentStatus,
}

impl AgentDoc {
    /// Whether this agent carries everything a withdrawal needs.
    /// Agents missing key material or an on-chain reference are skipped
    /// without error during a collection cycle.
    pub fn is_collectable(&self) -> bool {
        self.key_material.is_some() && self.ledger_object_id.is_some()
    }
}

impl IntoIndexes for AgentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on agent_id
            (
                doc! { "agent_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("agent_id_unique".to_string())
                        .build(),
                ),
            ),
            // Index on status for the active-agent query
            (
                doc! { "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AgentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
