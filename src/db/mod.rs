//! MongoDB storage layer for tollgate

pub mod agents;
pub mod mongo;
pub mod schemas;

pub use agents::{AgentStore, MemoryAgentStore, MongoAgentStore};
pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
