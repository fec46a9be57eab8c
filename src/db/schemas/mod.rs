//! Database schemas for tollgate
//!
//! Defines MongoDB document structures for agents and blob pointers.

mod agent;
mod blob_pointer;
mod metadata;

pub use agent::{AgentDoc, AgentStatus, KeyMaterial, AGENT_COLLECTION};
pub use blob_pointer::{BlobPointerDoc, BLOB_POINTER_COLLECTION};
pub use metadata::Metadata;
