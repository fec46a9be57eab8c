//! Durable pointer rows: agent id → current content hash.

use async_trait::async_trait;
use bson::doc;
use dashmap::DashMap;

use crate::db::mongo::MongoCollection;
use crate::db::schemas::BlobPointerDoc;
use crate::types::Result;

/// One live pointer per agent, upserted on every upload
#[async_trait]
pub trait PointerStore: Send + Sync {
    /// Current content hash for an agent, if a pointer exists.
    async fn get(&self, agent_id: &str) -> Result<Option<String>>;

    /// Atomically set the pointer for an agent, superseding any previous
    /// value. Last writer wins.
    async fn upsert(&self, agent_id: &str, content_hash: &str) -> Result<()>;
}

/// MongoDB-backed pointer store
pub struct MongoPointerStore {
    collection: MongoCollection<BlobPointerDoc>,
}

impl MongoPointerStore {
    pub fn new(collection: MongoCollection<BlobPointerDoc>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl PointerStore for MongoPointerStore {
    async fn get(&self, agent_id: &str) -> Result<Option<String>> {
        let doc = self
            .collection
            .find_one(doc! { "agent_id": agent_id })
            .await?;
        Ok(doc.map(|d| d.content_hash))
    }

    async fn upsert(&self, agent_id: &str, content_hash: &str) -> Result<()> {
        self.collection
            .upsert_one(
                doc! { "agent_id": agent_id },
                doc! {
                    "$set": {
                        "content_hash": content_hash,
                        "metadata.updated_at": bson::DateTime::now(),
                        "metadata.is_deleted": false,
                    },
                    "$setOnInsert": {
                        "metadata.created_at": bson::DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(())
    }
}

/// In-memory pointer store for dev mode and tests
#[derive(Default)]
pub struct MemoryPointerStore {
    pointers: DashMap<String, String>,
}

impl MemoryPointerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PointerStore for MemoryPointerStore {
    async fn get(&self, agent_id: &str) -> Result<Option<String>> {
        Ok(self.pointers.get(agent_id).map(|v| v.clone()))
    }

    async fn upsert(&self, agent_id: &str, content_hash: &str) -> Result<()> {
        self.pointers
            .insert(agent_id.to_string(), content_hash.to_string());
        Ok(())
    }
}
