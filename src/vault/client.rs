//! Vault API collaborator

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::{Config, VaultConfig};
use crate::error::Result;

use super::types::{InitiateResponse, PartialKeyRequest, PartialKeyResponse, VaultState};

/// Remote custody vault operations
#[async_trait]
pub trait VaultApi: Send + Sync {
    async fn get_vault_state(&self) -> Result<VaultState>;

    /// First-time setup of the split secret store
    async fn initiate_vault(&self) -> Result<()>;

    /// Submit one shard toward quorum
    async fn add_partial_key(&self, shard: &str) -> Result<()>;

    /// Abort an unseal in progress, or reseal an unsealed vault
    async fn cancel_unsealing(&self) -> Result<()>;
}

/// REST client for the vault endpoints
pub struct HttpVaultClient {
    api: ApiClient,
    paths: VaultConfig,
}

impl HttpVaultClient {
    pub fn new(api: ApiClient, paths: VaultConfig) -> Self {
        Self { api, paths }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ApiClient::new(&config.api)?, config.vault.clone()))
    }
}

#[async_trait]
impl VaultApi for HttpVaultClient {
    async fn get_vault_state(&self) -> Result<VaultState> {
        let path = &self.paths.state_path;
        let state: VaultState = self.api.send_json(path, self.api.get(path)?).await?;
        debug!(
            initiated = state.initiated,
            state = %state.state,
            received = state.received_shares,
            quorum = state.split_min,
            "Fetched vault state"
        );
        Ok(state)
    }

    async fn initiate_vault(&self) -> Result<()> {
        let path = &self.paths.initiate_path;
        info!("Initiating vault");
        let response: InitiateResponse = self.api.send_json(path, self.api.post(path)?).await?;
        response.into_result()
    }

    async fn add_partial_key(&self, shard: &str) -> Result<()> {
        let path = &self.paths.partial_key_path;
        let request = self.api.post(path)?.json(&PartialKeyRequest { key: shard });
        let response: PartialKeyResponse = self.api.send_json(path, request).await?;
        response.into_result()
    }

    async fn cancel_unsealing(&self) -> Result<()> {
        let path = &self.paths.cancel_path;
        info!("Cancelling unsealing");
        self.api.send(path, self.api.post(path)?).await?;
        Ok(())
    }
}
