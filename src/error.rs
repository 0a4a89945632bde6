//! Error types for the console core

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the console core
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Session errors
    #[error("Session expired or not authenticated")]
    SessionExpired,

    // Transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} from {endpoint}: {body}")]
    HttpStatus {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // Vault errors
    #[error("Vault rejected request: {0}")]
    VaultRejected(String),

    #[error("Vault state invariant violated: {0}")]
    VaultInvariant(String),

    // Workflow errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {action} while {step}")]
    InvalidTransition { step: String, action: String },

    #[error("Another vault action is already in progress")]
    Busy,

    #[error("Workflow detached, update discarded")]
    Detached,
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Timeout(_) | Error::HttpStatus { status: 500..=599, .. }
        )
    }

    /// Check if this error came from a remote call (network, server or malformed response)
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::HttpStatus { .. }
                | Error::Timeout(_)
                | Error::VaultRejected(_)
                | Error::Deserialization(_)
        )
    }
}
