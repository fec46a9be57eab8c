//! Object storage client for agent database blobs.
//!
//! The storage service is content-addressed: `put` returns the hash under
//! which the blob is reachable, `delete` removes a hash. Tollgate never
//! interprets blob bytes; it only moves them and tracks the current hash per
//! agent in the pointer collection.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::types::{Result, TollgateError};

/// Content-addressed blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob; returns the content hash it is addressable under.
    async fn put(&self, bytes: &[u8]) -> Result<String>;

    /// Delete a blob by content hash.
    async fn delete(&self, hash: &str) -> Result<()>;

    /// Whether a blob exists for the given hash.
    async fn exists(&self, hash: &str) -> Result<bool>;
}

/// Compute the canonical content address for a blob: `sha256-<hex>`.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("sha256-{}", hex::encode(digest))
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// Response from the storage service's put endpoint
#[derive(Debug, Deserialize)]
struct PutResponse {
    hash: String,
}

/// HTTP client for the external object storage service.
///
/// Contract: `PUT {base}/store` with the raw body returns `{"hash": "..."}`;
/// `DELETE {base}/store/{hash}` removes the blob; `HEAD {base}/store/{hash}`
/// answers existence.
pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn blob_url(&self, hash: &str) -> String {
        format!("{}/store/{}", self.base_url, hash)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let response = self
            .client
            .put(format!("{}/store", self.base_url))
            .timeout(self.timeout)
            .body(Bytes::copy_from_slice(bytes))
            .send()
            .await
            .map_err(|e| TollgateError::Storage(format!("put request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TollgateError::Storage(format!(
                "put returned {}",
                response.status()
            )));
        }

        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| TollgateError::Storage(format!("invalid put response: {e}")))?;

        debug!(hash = %put.hash, "Blob stored");
        Ok(put.hash)
    }

    async fn delete(&self, hash: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.blob_url(hash))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TollgateError::Storage(format!("delete request failed: {e}")))?;

        // 404 on delete is fine: the blob is already gone
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(TollgateError::Storage(format!(
                "delete returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn exists(&self, hash: &str) -> Result<bool> {
        let response = self
            .client
            .head(self.blob_url(hash))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TollgateError::Storage(format!("head request failed: {e}")))?;

        Ok(response.status().is_success())
    }
}

// =============================================================================
// In-memory implementation (dev mode and tests)
// =============================================================================

/// In-memory content-addressed store.
///
/// Hashes with SHA-256, the same address form the storage service returns.
/// Deletes can be made to fail to exercise the best-effort replace path.
#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: DashMap<String, Vec<u8>>,
    fail_deletes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deletes fail (orphaned-blob scenarios in tests).
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let hash = content_hash(bytes);
        self.blobs.insert(hash.clone(), bytes.to_vec());
        Ok(hash)
    }

    async fn delete(&self, hash: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TollgateError::Storage("delete unavailable".into()));
        }
        self.blobs.remove(hash);
        Ok(())
    }

    async fn exists(&self, hash: &str) -> Result<bool> {
        Ok(self.blobs.contains_key(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        let h1 = content_hash(b"agent database v1");
        let h2 = content_hash(b"agent database v1");
        assert_eq!(h1, h2);
        assert!(h1.starts_with("sha256-"));
        assert_eq!(h1.len(), "sha256-".len() + 64);
    }

    #[test]
    fn test_content_hash_differs_by_content() {
        assert_ne!(content_hash(b"v1"), content_hash(b"v2"));
    }

    #[tokio::test]
    async fn test_memory_store_put_and_exists() {
        let store = MemoryObjectStore::new();
        let hash = store.put(b"blob bytes").await.unwrap();

        assert!(store.exists(&hash).await.unwrap());
        assert!(!store.exists("sha256-missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_delete() {
        let store = MemoryObjectStore::new();
        let hash = store.put(b"blob bytes").await.unwrap();

        store.delete(&hash).await.unwrap();
        assert!(!store.exists(&hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_failing_delete() {
        let store = MemoryObjectStore::new();
        let hash = store.put(b"blob bytes").await.unwrap();

        store.set_fail_deletes(true);
        assert!(store.delete(&hash).await.is_err());
        // Blob survives the failed delete (orphan)
        assert!(store.exists(&hash).await.unwrap());
    }
}
