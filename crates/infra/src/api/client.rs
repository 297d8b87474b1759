//! HTTP client for the remote authority.
//!
//! Thin wrapper over `reqwest` that attaches the session bearer token,
//! enforces a per-request timeout, and maps transport and status failures
//! onto the sync error taxonomy.

use std::sync::Arc;
use std::time::Duration;

use fieldsync_core::SyncError;
use fieldsync_domain::{FieldSyncError, Result as DomainResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};

use super::auth::SessionTokenStore;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the remote authority (e.g. "https://api.example.org/v1")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8080".to_string(), timeout: Duration::from_secs(30) }
    }
}

/// Shared HTTP client for submissions, reference data, and health probes.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    tokens: Arc<SessionTokenStore>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, tokens: Arc<SessionTokenStore>) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FieldSyncError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config, tokens })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build a request for the given path, attaching the session token when
    /// one exists. Requests without a valid session are still sent; the
    /// server answers 401 and the caller maps it.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let builder = self.http.request(method, url);
        match self.tokens.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and map the outcome onto [`SyncError`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return Err(SyncError::Timeout(self.config.timeout)),
            Err(err) if err.is_connect() => {
                debug!(error = %err, "Connection failed");
                return Err(SyncError::Unreachable);
            }
            Err(err) => return Err(SyncError::Submission(err.to_string())),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SyncError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(SyncError::Submission(format!("HTTP {status}")));
        }
        Ok(response)
    }

    /// Probe the health endpoint. Any failure reads as unhealthy.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "Health check returned non-success status");
                false
            }
            Err(err) => {
                debug!(error = %err, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, tokens: Arc<SessionTokenStore>) -> ApiClient {
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        ApiClient::new(config, tokens).expect("client built")
    }

    #[tokio::test]
    async fn health_check_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(SessionTokenStore::new()));
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn health_check_unhealthy_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(SessionTokenStore::new()));
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shifts"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(SessionTokenStore::new()));
        let result = client.send(client.request(Method::GET, "/shifts")).await;
        assert!(matches!(result, Err(SyncError::Unauthenticated)));
    }

    #[tokio::test]
    async fn bearer_token_is_attached_when_session_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shifts"))
            .and(header("Authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let tokens = Arc::new(SessionTokenStore::new());
        tokens.set_session("token-123", chrono::Utc::now() + chrono::Duration::hours(1));

        let client = client_for(&server, tokens);
        let result = client.send(client.request(Method::GET, "/shifts")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn server_error_maps_to_submission() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shifts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(SessionTokenStore::new()));
        let result = client.send(client.request(Method::GET, "/shifts")).await;
        assert!(matches!(result, Err(SyncError::Submission(_))));
    }
}
