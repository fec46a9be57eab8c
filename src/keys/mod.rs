//! Key material handling.
//!
//! Agent keys stay encrypted at rest (see `db::schemas::KeyMaterial`); the
//! only key this service ever decrypts is the sponsor's, once, at startup.

pub mod crypto;
pub mod sponsor;

pub use sponsor::{encrypt_to_bundle, SponsorIdentity};
