//! Shared REST plumbing for the platform admin API
//!
//! Builds endpoint URLs from the configured base, attaches the bearer token
//! and maps transport failures into [`Error`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Thin wrapper around `reqwest::Client` bound to one API base URL
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: url::Url,
    token: Option<String>,
    timeout_ms: u64,
}

impl ApiClient {
    /// Build a client from API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base_url = url::Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Base URL cannot carry paths: {}",
                config.base_url
            )));
        }
        // Url::join drops the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: (!config.token.is_empty()).then(|| config.token.clone()),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Resolve an absolute endpoint path ("/storage/state") against the base URL
    pub fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid endpoint path {}: {}", path, e)))
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self.authorize(self.client.get(url)))
    }

    pub fn post(&self, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self.authorize(self.client.post(url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, turning non-2xx statuses into `Error::HttpStatus`
    pub async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        debug!(endpoint = %path, "Sending request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout_ms)
            } else {
                Error::Http(format!("Request to {} failed: {}", path, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                endpoint: path.to_string(),
                body,
            });
        }

        Ok(response)
    }

    /// Send a request and decode a JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(path, request).await?;
        response.json::<T>().await.map_err(|e| {
            Error::Deserialization(format!("Failed to parse {} response: {}", path, e))
        })
    }
}
