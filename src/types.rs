//! Crate-wide error type and result alias.
//!
//! One taxonomy covers the whole service. The important distinction is
//! recoverability: `Preparation`/`Signing`/`Submission` are per-agent and die
//! at the collection-cycle boundary, `Storage`/`Database` propagate to the
//! HTTP caller, and `Config` is fatal at startup.

use thiserror::Error;

/// Errors produced by tollgate services
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Missing or inconsistent configuration - fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected at the HTTP boundary before reaching any service
    #[error("Validation error: {0}")]
    Validation(String),

    /// Withdrawal preparation rejected by the ledger service
    #[error("Preparation error: {0}")]
    Preparation(String),

    /// Failed to produce or decode a signature
    #[error("Signing error: {0}")]
    Signing(String),

    /// Ledger submission failed or finality reported non-success
    #[error("Submission error: {0}")]
    Submission(String),

    /// Object storage put/delete failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Lookup target does not exist (normal outcome, not a transport fault)
    #[error("Not found: {0}")]
    NotFound(String),

    /// MongoDB transport or query failure
    #[error("Database error: {0}")]
    Database(String),

    /// Invariant violation inside the process
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TollgateError>;

impl TollgateError {
    /// Whether this error is recoverable at the collection-cycle level
    /// (logged, agent skipped for this cycle, retried next cycle).
    pub fn is_per_agent(&self) -> bool {
        matches!(
            self,
            TollgateError::Preparation(_)
                | TollgateError::Signing(_)
                | TollgateError::Submission(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_agent_classification() {
        assert!(TollgateError::Preparation("bad object ref".into()).is_per_agent());
        assert!(TollgateError::Submission("rejected".into()).is_per_agent());
        assert!(!TollgateError::Config("missing sponsor key".into()).is_per_agent());
        assert!(!TollgateError::Database("timeout".into()).is_per_agent());
    }

    #[test]
    fn test_display_includes_detail() {
        let e = TollgateError::Storage("put failed: 503".into());
        assert_eq!(e.to_string(), "Storage error: put failed: 503");
    }
}
