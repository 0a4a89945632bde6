//! Shard form validation

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Default minimum shard length after trimming
pub const DEFAULT_MIN_SHARD_LENGTH: usize = 3;

/// Validate a typed shard and return its trimmed form
pub fn validate_shard(input: &str, min_length: usize) -> Result<&str> {
    let shard = input.trim();
    if shard.chars().count() < min_length {
        return Err(Error::Validation(format!(
            "Shard must be at least {} characters",
            min_length
        )));
    }
    Ok(shard)
}

/// Short SHA-256 fingerprint for logs; the shard itself is never logged
pub fn fingerprint(shard: &str) -> String {
    let digest = Sha256::digest(shard.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
