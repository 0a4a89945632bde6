//! Vault status and response types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Seal state reported by the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SealState {
    Sealed,
    /// Some shards received, quorum not yet reached
    Waiting,
    Unsealed,
}

impl fmt::Display for SealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SealState::Sealed => write!(f, "sealed"),
            SealState::Waiting => write!(f, "waiting"),
            SealState::Unsealed => write!(f, "unsealed"),
        }
    }
}

/// Custody vault status as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub initiated: bool,
    pub state: SealState,
    /// Shards required for quorum
    pub split_min: u32,
    /// Shards in existence
    pub split_max: u32,
    #[serde(rename = "recieved_shares")]
    pub received_shares: u32,
}

impl VaultState {
    /// Shards still needed; only meaningful while waiting
    pub fn remaining_shards(&self) -> Option<u32> {
        match self.state {
            SealState::Waiting => Some(self.split_min.saturating_sub(self.received_shares)),
            _ => None,
        }
    }

    /// Check `received_shares <= split_min <= split_max`
    pub fn check_invariant(&self) -> Result<()> {
        if self.received_shares > self.split_min {
            return Err(Error::VaultInvariant(format!(
                "received {} shares but quorum is {}",
                self.received_shares, self.split_min
            )));
        }
        if self.split_min > self.split_max {
            return Err(Error::VaultInvariant(format!(
                "quorum {} exceeds total shards {}",
                self.split_min, self.split_max
            )));
        }
        Ok(())
    }
}

/// Error body of a failed initiation
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateError {
    pub error_message: String,
}

/// Response of the initiate endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateResponse {
    pub success: bool,
    pub error: Option<InitiateError>,
}

impl InitiateResponse {
    pub fn into_result(self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        let message = self
            .error
            .map(|e| e.error_message)
            .unwrap_or_else(|| "Vault initiation failed".to_string());
        Err(Error::VaultRejected(message))
    }
}

/// Request body for a partial key submission
#[derive(Debug, Clone, Serialize)]
pub struct PartialKeyRequest<'a> {
    pub key: &'a str,
}

/// Response of the partial key endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PartialKeyResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl PartialKeyResponse {
    pub fn into_result(self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(Error::VaultRejected(
            self.error
                .unwrap_or_else(|| "Partial key rejected".to_string()),
        ))
    }
}
