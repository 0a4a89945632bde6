//! Session check used to gate detail sheets
//!
//! The console never owns authentication; it only asks the platform whether
//! the current session is still valid.

use async_trait::async_trait;
use tracing::debug;

use crate::api::ApiClient;
use crate::error::{Error, Result};

/// "Is the current session still valid" check
#[async_trait]
pub trait AuthProbe: Send + Sync {
    /// Resolve if the session is valid, fail otherwise
    async fn check_auth(&self) -> Result<()>;
}

/// Probe backed by the platform's auth check endpoint
pub struct HttpAuthProbe {
    api: ApiClient,
    check_path: String,
}

impl HttpAuthProbe {
    pub fn new(api: ApiClient, check_path: impl Into<String>) -> Self {
        Self {
            api,
            check_path: check_path.into(),
        }
    }
}

#[async_trait]
impl AuthProbe for HttpAuthProbe {
    async fn check_auth(&self) -> Result<()> {
        let request = self.api.get(&self.check_path)?;
        match self.api.send(&self.check_path, request).await {
            Ok(_) => Ok(()),
            Err(Error::HttpStatus { status: 401 | 403, .. }) => {
                debug!("Auth check rejected session");
                Err(Error::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }
}

/// Probe that always accepts; for offline sessions and tests
pub struct AllowAll;

#[async_trait]
impl AuthProbe for AllowAll {
    async fn check_auth(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check_against(server: &MockServer, token: &str) -> HttpAuthProbe {
        let api = ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            timeout_ms: 1000,
            token: token.to_string(),
        })
        .unwrap();
        HttpAuthProbe::new(api, "/auth/check")
    }

    #[tokio::test]
    async fn test_valid_session_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/check"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        assert!(check_against(&server, "secret").check_auth().await.is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_means_session_expired() {
        for status in [401, 403] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/auth/check"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let result = check_against(&server, "").check_auth().await;
            assert!(
                matches!(result, Err(Error::SessionExpired)),
                "status {} gave {:?}",
                status,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_session_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/check"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = check_against(&server, "").check_auth().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 502, .. }));
        assert!(err.is_remote_failure());
    }
}
