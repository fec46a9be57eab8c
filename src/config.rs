//! Configuration for tollgate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use uuid::Uuid;

/// Tollgate - fee-collection scheduler and blob gateway for on-chain agents
#[derive(Parser, Debug, Clone)]
#[command(name = "tollgate")]
#[command(about = "Fee-collection scheduler and blob gateway for on-chain agents")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory stores, ephemeral sponsor key)
    #[arg(
        long,
        env = "DEV_MODE",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "tollgate")]
    pub mongodb_db: String,

    /// Base URL of the object storage service for agent database blobs
    /// (e.g., "http://localhost:8091")
    #[arg(long, env = "STORAGE_URL", default_value = "http://localhost:8091")]
    pub storage_url: String,

    /// Base URL of the ledger service (withdrawal preparation + submission)
    /// (e.g., "http://localhost:9000")
    #[arg(long, env = "LEDGER_URL", default_value = "http://localhost:9000")]
    pub ledger_url: String,

    /// Sponsor key bundle: base64(salt || nonce || ciphertext)
    /// Decrypted once at startup; required in production mode
    #[arg(long, env = "SPONSOR_KEY")]
    pub sponsor_key: Option<String>,

    /// Passphrase for the sponsor key bundle (Argon2id KEK derivation)
    #[arg(long, env = "SPONSOR_PASSPHRASE")]
    pub sponsor_passphrase: Option<String>,

    /// Destination address for collected fees; required in production mode
    #[arg(long, env = "COLLECTION_ADDRESS")]
    pub collection_address: Option<String>,

    /// Fee amount withdrawn from each agent's gas reserve per cycle
    /// (smallest ledger unit)
    #[arg(long, env = "FEE_AMOUNT", default_value = "100000000")]
    pub fee_amount: u64,

    /// Collection cycle period in seconds (default: one hour)
    #[arg(long, env = "COLLECTION_INTERVAL_SECS", default_value = "3600")]
    pub collection_interval_secs: u64,

    /// Maintenance cycle cadence: run once every N collection cycles
    #[arg(long, env = "MAINTENANCE_CADENCE", default_value = "6")]
    pub maintenance_cadence: u32,

    /// Hash cache TTL in seconds
    #[arg(long, env = "HASH_CACHE_TTL_SECS", default_value = "3600")]
    pub hash_cache_ttl_secs: u64,

    /// Maximum accepted blob upload size in bytes (default: 16 MB)
    #[arg(long, env = "MAX_BLOB_BYTES", default_value = "16777216")]
    pub max_blob_bytes: usize,

    /// Request timeout for ledger and storage calls in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Collection cycle period as a Duration
    pub fn collection_period(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }

    /// Hash cache TTL as a Duration
    pub fn hash_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.hash_cache_ttl_secs)
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    ///
    /// The scheduler must never run half-configured: a missing sponsor key or
    /// collection address outside dev mode is fatal before anything starts.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.sponsor_key.is_none() {
                return Err("SPONSOR_KEY is required in production mode".to_string());
            }
            if self.sponsor_passphrase.is_none() {
                return Err("SPONSOR_PASSPHRASE is required in production mode".to_string());
            }
            if self.collection_address.is_none() {
                return Err("COLLECTION_ADDRESS is required in production mode".to_string());
            }
        }

        if self.fee_amount == 0 {
            return Err("FEE_AMOUNT must be greater than zero".to_string());
        }

        if self.collection_interval_secs == 0 {
            return Err("COLLECTION_INTERVAL_SECS must be greater than zero".to_string());
        }

        if self.maintenance_cadence == 0 {
            return Err("MAINTENANCE_CADENCE must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_args() -> Args {
        Args::parse_from(["tollgate", "--dev-mode", "true"])
    }

    #[test]
    fn test_dev_mode_allows_missing_sponsor_config() {
        let args = dev_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_sponsor_key() {
        let args = Args::parse_from(["tollgate"]);
        let err = args.validate().unwrap_err();
        assert!(err.contains("SPONSOR_KEY"));
    }

    #[test]
    fn test_zero_fee_rejected() {
        let mut args = dev_args();
        args.fee_amount = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let mut args = dev_args();
        args.maintenance_cadence = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_default_period_is_one_hour() {
        let args = dev_args();
        assert_eq!(args.collection_period(), Duration::from_secs(3600));
    }
}
