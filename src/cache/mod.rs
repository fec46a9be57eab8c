//! In-process caching for tollgate

pub mod store;

pub use store::{spawn_cleanup_task, CacheStatsSnapshot, HashCache, HashCacheConfig};
