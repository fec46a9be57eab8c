//! Replace-on-write blob management.
//!
//! Each agent has at most one current database blob. An upload supersedes
//! the previous blob: the old hash is deleted from object storage
//! best-effort, the new bytes are stored, the pointer row is upserted, and
//! the hash cache is written through. A failed delete leaves an orphan in
//! object storage - an accepted cost; a failed put aborts the upload before
//! the pointer moves.
//!
//! Uploads for the same agent are not serialized against each other:
//! concurrent callers race last-writer-wins on the pointer row and the
//! loser's blob becomes an orphan.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::HashCache;
use crate::storage::ObjectStore;
use crate::types::Result;

use super::pointers::PointerStore;

/// Outcome of an upload
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadReceipt {
    /// Content hash the blob is now addressable under
    pub hash: String,
    /// Blob size in bytes
    pub size: usize,
    /// Whether a previous blob was superseded
    pub replaced: bool,
}

/// Orchestrates object storage, the pointer collection, and the hash cache
pub struct BlobStoreManager {
    store: Arc<dyn ObjectStore>,
    pointers: Arc<dyn PointerStore>,
    cache: Arc<HashCache>,
}

impl BlobStoreManager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        pointers: Arc<dyn PointerStore>,
        cache: Arc<HashCache>,
    ) -> Self {
        Self {
            store,
            pointers,
            cache,
        }
    }

    /// Store a new blob for an agent, superseding any previous one.
    ///
    /// Returns the new content hash. A `Storage` error from the put step
    /// aborts the upload with the previous pointer intact; a failed delete
    /// of the superseded blob is logged and tolerated.
    pub async fn upload(&self, agent_id: &str, bytes: &[u8]) -> Result<UploadReceipt> {
        let previous = self.pointers.get(agent_id).await?;

        if let Some(ref old_hash) = previous {
            // Best-effort: an orphaned blob is cheaper than a failed upload
            if let Err(e) = self.store.delete(old_hash).await {
                warn!(
                    agent = %agent_id,
                    hash = %old_hash,
                    error = %e,
                    "Failed to delete superseded blob, leaving orphan"
                );
            } else {
                debug!(agent = %agent_id, hash = %old_hash, "Superseded blob deleted");
            }
        }

        let hash = self.store.put(bytes).await?;

        self.pointers.upsert(agent_id, &hash).await?;
        self.cache.insert(agent_id, &hash);

        info!(
            agent = %agent_id,
            hash = %hash,
            size = bytes.len(),
            replaced = previous.is_some(),
            "Blob uploaded"
        );

        Ok(UploadReceipt {
            hash,
            size: bytes.len(),
            replaced: previous.is_some(),
        })
    }

    /// Current content hash for an agent.
    ///
    /// Served from the hash cache when possible; otherwise the pointer row
    /// is read and the cache refreshed. `Ok(None)` means no blob has ever
    /// been uploaded for this agent - a normal outcome, distinct from a
    /// `Database` error. Blob bytes are never fetched here; clients pull
    /// them from object storage directly by hash.
    pub async fn retrieve(&self, agent_id: &str) -> Result<Option<String>> {
        if let Some(hash) = self.cache.get(agent_id) {
            debug!(agent = %agent_id, hash = %hash, "Pointer served from cache");
            return Ok(Some(hash));
        }

        match self.pointers.get(agent_id).await? {
            Some(hash) => {
                self.cache.insert(agent_id, &hash);
                debug!(agent = %agent_id, hash = %hash, "Pointer served from store");
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::pointers::MemoryPointerStore;
    use crate::cache::{HashCache, HashCacheConfig};
    use crate::storage::MemoryObjectStore;
    use std::time::Duration;

    fn manager() -> (Arc<MemoryObjectStore>, Arc<MemoryPointerStore>, BlobStoreManager) {
        let store = Arc::new(MemoryObjectStore::new());
        let pointers = Arc::new(MemoryPointerStore::new());
        let cache = Arc::new(HashCache::with_defaults());
        let mgr = BlobStoreManager::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&pointers) as Arc<dyn PointerStore>,
            cache,
        );
        (store, pointers, mgr)
    }

    #[tokio::test]
    async fn test_replace_on_write_round_trip() {
        let (store, _, mgr) = manager();

        let v1 = mgr.upload("agent-1", b"database v1").await.unwrap();
        assert!(!v1.replaced);
        assert_eq!(
            mgr.retrieve("agent-1").await.unwrap().as_deref(),
            Some(v1.hash.as_str())
        );

        let v2 = mgr.upload("agent-1", b"database v2").await.unwrap();
        assert!(v2.replaced);
        assert_ne!(v2.hash, v1.hash);

        // The superseded hash is never served again
        assert_eq!(
            mgr.retrieve("agent-1").await.unwrap().as_deref(),
            Some(v2.hash.as_str())
        );

        // Delete succeeded: the old blob is gone from storage
        assert!(!store.exists(&v1.hash).await.unwrap());
        assert!(store.exists(&v2.hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_orphan_but_upload_succeeds() {
        let (store, _, mgr) = manager();

        let v1 = mgr.upload("agent-1", b"database v1").await.unwrap();

        store.set_fail_deletes(true);
        let v2 = mgr.upload("agent-1", b"database v2").await.unwrap();

        // Orphan tolerated in storage, but retrieve never returns it
        assert!(store.exists(&v1.hash).await.unwrap());
        assert_eq!(
            mgr.retrieve("agent-1").await.unwrap().as_deref(),
            Some(v2.hash.as_str())
        );
    }

    #[tokio::test]
    async fn test_cache_matches_pointer_after_upload() {
        let store = Arc::new(MemoryObjectStore::new());
        let pointers = Arc::new(MemoryPointerStore::new());
        let cache = Arc::new(HashCache::with_defaults());
        let mgr = BlobStoreManager::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&pointers) as Arc<dyn PointerStore>,
            Arc::clone(&cache),
        );

        let receipt = mgr.upload("agent-1", b"database v1").await.unwrap();

        let cached = cache.get("agent-1");
        let stored = pointers.get("agent-1").await.unwrap();
        assert_eq!(cached.as_deref(), Some(receipt.hash.as_str()));
        assert_eq!(cached, stored);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_agent_is_none() {
        let (_, _, mgr) = manager();
        assert!(mgr.retrieve("never-uploaded").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retrieve_refreshes_expired_cache_from_pointer() {
        let store = Arc::new(MemoryObjectStore::new());
        let pointers = Arc::new(MemoryPointerStore::new());
        let cache = Arc::new(HashCache::new(HashCacheConfig {
            ttl: Duration::from_millis(10),
            ..Default::default()
        }));
        let mgr = BlobStoreManager::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&pointers) as Arc<dyn PointerStore>,
            Arc::clone(&cache),
        );

        let receipt = mgr.upload("agent-1", b"database v1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Cache entry expired; retrieve falls back to the pointer row
        assert_eq!(
            mgr.retrieve("agent-1").await.unwrap().as_deref(),
            Some(receipt.hash.as_str())
        );
        // And the cache is warm again
        assert_eq!(cache.get("agent-1").as_deref(), Some(receipt.hash.as_str()));
    }

    #[tokio::test]
    async fn test_distinct_agents_do_not_interfere() {
        let (_, _, mgr) = manager();

        let a = mgr.upload("agent-a", b"database a").await.unwrap();
        let b = mgr.upload("agent-b", b"database b").await.unwrap();

        assert_ne!(a.hash, b.hash);
        assert_eq!(
            mgr.retrieve("agent-a").await.unwrap().as_deref(),
            Some(a.hash.as_str())
        );
        assert_eq!(
            mgr.retrieve("agent-b").await.unwrap().as_deref(),
            Some(b.hash.as_str())
        );
    }
}
