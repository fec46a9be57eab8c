//! Content-addressed database-blob store

pub mod manager;
pub mod pointers;

pub use manager::{BlobStoreManager, UploadReceipt};
pub use pointers::{MemoryPointerStore, MongoPointerStore, PointerStore};
