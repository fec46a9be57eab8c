//! Tollgate - fee-collection scheduler and blob gateway for on-chain agents
//!
//! Tollgate runs two loosely coupled services in one process:
//!
//! - **Collector**: a periodic scheduler that withdraws a fixed fee from
//!   every active agent's gas reserve, using dual-signature sponsored
//!   transactions so the sponsor pays the network cost
//! - **Blobs**: a content-addressed store for agent database snapshots,
//!   with replace-on-write semantics and a TTL hash cache in front of the
//!   pointer collection
//!
//! Agent signing keys stay encrypted at rest and are never decrypted here;
//! the ledger's withdrawal-preparation service supplies agent signatures,
//! and tollgate holds only the sponsor key in memory.

pub mod blobs;
pub mod cache;
pub mod collector;
pub mod config;
pub mod db;
pub mod keys;
pub mod ledger;
pub mod routes;
pub mod server;
pub mod storage;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, TollgateError};
