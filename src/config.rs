//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the API bearer token
pub const API_TOKEN_ENV: &str = "CONSOLE_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Bearer token; normally supplied through CONSOLE_API_TOKEN
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_check_path")]
    pub check_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            check_path: default_auth_check_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default = "default_initiate_path")]
    pub initiate_path: String,
    #[serde(default = "default_partial_key_path")]
    pub partial_key_path: String,
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,
    /// Shards shorter than this (after trimming) are rejected before any request
    #[serde(default = "default_min_shard_length")]
    pub min_shard_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            initiate_path: default_initiate_path(),
            partial_key_path: default_partial_key_path(),
            cancel_path: default_cancel_path(),
            min_shard_length: default_min_shard_length(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}
fn default_timeout_ms() -> u64 { 10_000 }
fn default_auth_check_path() -> String { "/auth/check".to_string() }
fn default_state_path() -> String { "/storage/state".to_string() }
fn default_initiate_path() -> String { "/storage/initiate".to_string() }
fn default_partial_key_path() -> String { "/storage/partial-key".to_string() }
fn default_cancel_path() -> String { "/storage/cancel-unsealing".to_string() }
fn default_min_shard_length() -> usize { 3 }

impl Config {
    /// Load configuration from file and environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("api.base_url", default_base_url())?
            .set_default("api.timeout_ms", default_timeout_ms() as i64)?
            .set_default("api.token", "")?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix CONSOLE_)
            .add_source(
                config::Environment::with_prefix("CONSOLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.is_empty() {
                config.api.token = token;
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("api.base_url cannot be used as a base: {}", self.api.base_url);
        }

        if self.api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be greater than 0");
        }

        if self.vault.min_shard_length == 0 {
            anyhow::bail!("vault.min_shard_length must be at least 1");
        }

        for (name, path) in [
            ("auth.check_path", &self.auth.check_path),
            ("vault.state_path", &self.vault.state_path),
            ("vault.initiate_path", &self.vault.initiate_path),
            ("vault.partial_key_path", &self.vault.partial_key_path),
            ("vault.cancel_path", &self.vault.cancel_path),
        ] {
            if !path.starts_with('/') {
                anyhow::bail!("{} must start with '/', got {}", name, path);
            }
        }

        if self.api.token.is_empty() {
            tracing::warn!(
                "No API token configured ({} unset) - requests will be unauthenticated",
                API_TOKEN_ENV
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  API:
    base_url: {}
    timeout: {}ms
    token: {}
  Auth:
    check_path: {}
  Vault:
    state_path: {}
    initiate_path: {}
    partial_key_path: {}
    cancel_path: {}
    min_shard_length: {}
"#,
            mask_url(&self.api.base_url),
            self.api.timeout_ms,
            if self.api.token.is_empty() {
                "(not set)"
            } else {
                "***"
            },
            self.auth.check_path,
            self.vault.state_path,
            self.vault.initiate_path,
            self.vault.partial_key_path,
            self.vault.cancel_path,
            self.vault.min_shard_length,
        )
    }
}

/// Mask URL for display (hide credentials in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: default_base_url(),
                timeout_ms: default_timeout_ms(),
                token: String::new(),
            },
            auth: AuthConfig::default(),
            vault: VaultConfig::default(),
        }
    }
}
