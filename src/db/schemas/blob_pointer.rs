//! Blob pointer document schema
//!
//! One row per agent mapping to the current content hash in object storage.
//! A successful upload supersedes the previous hash; superseded rows are
//! upserted in place, never versioned.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for blob pointers
pub const BLOB_POINTER_COLLECTION: &str = "blob_pointers";

/// Pointer from an agent to its current database blob
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BlobPointerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning agent (unique key)
    pub agent_id: String,

    /// Content hash of the current blob in object storage
    pub content_hash: String,
}

impl IntoIndexes for BlobPointerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "agent_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("agent_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for BlobPointerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
