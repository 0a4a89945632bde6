//! Merchant Console Library
//!
//! Client workflow core of the payments platform admin console: the detail
//! sheet registry and the custody vault unsealing workflow.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod overlay;
pub mod vault;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use overlay::{SheetKind, SheetPayload, SheetRegistry};
pub use vault::{UnsealWorkflow, VaultState};
