//! In-process hash cache for blob pointers.
//!
//! Maps agent id to the last content hash this process observed, with a
//! fixed TTL, to avoid a durable-store round-trip on every retrieval. The
//! cache is derived state: always reconstructible from the pointer
//! collection, never persisted, and possibly stale relative to a pointer
//! updated by another process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// Configuration for the hash cache
#[derive(Debug, Clone)]
pub struct HashCacheConfig {
    /// How long an entry stays valid
    pub ttl: Duration,

    /// How often the cleanup task sweeps expired entries
    pub cleanup_interval: Duration,
}

impl Default for HashCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// A cached content hash with its expiry
struct CachedHash {
    hash: String,
    expires_at: Instant,
}

impl CachedHash {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Statistics for the hash cache
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub evictions: AtomicU64,
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// Agent id → current content hash, TTL-bounded
pub struct HashCache {
    entries: DashMap<String, CachedHash>,
    config: HashCacheConfig,
    stats: CacheStats,
}

impl HashCache {
    pub fn new(config: HashCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(HashCacheConfig::default())
    }

    /// Cache the current hash for an agent, refreshing the TTL.
    ///
    /// Concurrent writers for the same agent race last-writer-wins, matching
    /// the pointer-row semantics.
    pub fn insert(&self, agent_id: &str, hash: &str) {
        self.entries.insert(
            agent_id.to_string(),
            CachedHash {
                hash: hash.to_string(),
                expires_at: Instant::now() + self.config.ttl,
            },
        );
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the cached hash for an agent, if present and unexpired.
    pub fn get(&self, agent_id: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(agent_id) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(agent_id);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.hash.clone());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Drop the entry for an agent.
    pub fn remove(&self, agent_id: &str) -> bool {
        self.entries.remove(agent_id).is_some()
    }

    /// Remove all expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, v| {
            if v.is_expired() {
                removed += 1;
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &HashCacheConfig {
        &self.config
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Spawn a periodic cleanup task that sweeps expired entries.
pub fn spawn_cleanup_task(cache: Arc<HashCache>) -> tokio::task::JoinHandle<()> {
    let interval = cache.config.cleanup_interval;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = cache.sweep();
            if removed > 0 {
                debug!(entries_removed = removed, "Swept expired hash cache entries");
            }
        }
    })
}
