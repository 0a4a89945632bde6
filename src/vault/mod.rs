//! Custody vault unsealing
//!
//! The vault's operating secret is split into shards; a quorum of them
//! (`split_min` of `split_max`) must be submitted to unseal it.
//!
//! # Architecture
//!
//! ```text
//! operator ──▶ UnsealWorkflow ──▶ VaultApi (HttpVaultClient)
//!                   │                  │
//!              shard validation   re-fetch state after every mutation
//! ```

pub mod client;
pub mod shard;
pub mod types;
pub mod workflow;

pub use client::{HttpVaultClient, VaultApi};
pub use shard::{fingerprint, validate_shard};
pub use types::{SealState, VaultState};
pub use workflow::{UnsealStep, UnsealWorkflow, WorkflowView};
