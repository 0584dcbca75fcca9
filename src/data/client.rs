//! HTTP client shared by both rating providers
//!
//! One GET per call, an explicit deadline per request and a cancellation token
//! checked alongside it. Provider-specific URL building and parsing come from
//! the adapter selected by [`Provider`].

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Provider;

/// Deadline applied to every provider request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Errors that can occur when fetching a rating
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or transport failure
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not finish before the deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered with a non-success status
    #[error("HTTP error! status: {0}")]
    Http(StatusCode),

    /// Malformed JSON or missing rating field
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The configured base URL could not be turned into an endpoint
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The request was abandoned through the cancellation token
    #[error("request cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

/// Outcome of a raw endpoint check, bypassing any cache
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub provider: Provider,
    pub url: Option<String>,
    /// Request succeeded and a rating could be extracted
    pub success: bool,
    /// HTTP status code, when a response arrived
    pub status: Option<u16>,
    /// Parsed rating, when available
    pub rating: Option<u32>,
    /// Raw JSON payload, when the body was JSON
    pub data: Option<Value>,
    pub error: Option<String>,
}

/// Client for fetching ratings from Codeforces and CodeChef
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http_client: Client,
    codeforces_url: String,
    codechef_url: String,
    timeout: Duration,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    /// Creates a client against the public endpoints with the default deadline
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            codeforces_url: Provider::Codeforces.default_base_url().to_string(),
            codechef_url: Provider::CodeChef.default_base_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides both provider base URLs (mock servers, mirrors)
    pub fn with_base_urls(
        mut self,
        codeforces_url: impl Into<String>,
        codechef_url: impl Into<String>,
    ) -> Self {
        self.codeforces_url = codeforces_url.into();
        self.codechef_url = codechef_url.into();
        self
    }

    /// Sets the per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL configured for `provider`
    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Codeforces => &self.codeforces_url,
            Provider::CodeChef => &self.codechef_url,
        }
    }

    /// Fetches the current rating for `handle`
    ///
    /// # Returns
    /// * `Ok(rating)` - Rating extracted from the provider response
    /// * `Err(FetchError)` - Network, timeout, HTTP status, parse, or cancellation failure
    pub async fn try_fetch(
        &self,
        provider: Provider,
        handle: &str,
        cancel: &CancellationToken,
    ) -> Result<u32, FetchError> {
        let url = provider.endpoint(self.base_url(provider), handle)?;
        debug!(%provider, %url, "fetching rating");

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = self.get_body(url) => body?,
        };

        let rating = provider.parse_rating(&body)?;
        debug!(%provider, handle, rating, "rating fetched");
        Ok(rating)
    }

    /// Fetches the current rating, absorbing every failure into `None`
    pub async fn fetch_rating(&self, provider: Provider, handle: &str) -> Option<u32> {
        match self
            .try_fetch(provider, handle, &CancellationToken::new())
            .await
        {
            Ok(rating) => Some(rating),
            Err(e) => {
                warn!(%provider, handle, error = %e, "error fetching rating");
                None
            }
        }
    }

    /// Hits the provider endpoint directly and reports what came back
    pub async fn probe(&self, provider: Provider, handle: &str) -> ProbeResult {
        let mut result = ProbeResult {
            provider,
            url: None,
            success: false,
            status: None,
            rating: None,
            data: None,
            error: None,
        };

        let url = match provider.endpoint(self.base_url(provider), handle) {
            Ok(url) => url,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        };
        result.url = Some(url.to_string());

        let response = match self.send(url).await {
            Ok(response) => response,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        };

        let status = response.status();
        result.status = Some(status.as_u16());

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                result.error = Some(self.classify(e).to_string());
                return result;
            }
        };
        result.data = serde_json::from_str(&body).ok();

        if !status.is_success() {
            result.error = Some(FetchError::Http(status).to_string());
            return result;
        }

        match provider.parse_rating(&body) {
            Ok(rating) => {
                result.success = true;
                result.rating = Some(rating);
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        result
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        self.http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))
    }

    async fn get_body(&self, url: Url) -> Result<String, FetchError> {
        let response = self.send(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tokio::net::TcpListener;

    /// Accepts connections and never answers them
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_defaults() {
        let client = ProviderClient::default();
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.base_url(Provider::Codeforces), crate::data::codeforces::BASE_URL);
        assert_eq!(client.base_url(Provider::CodeChef), crate::data::codechef::BASE_URL);
    }

    #[tokio::test]
    async fn test_fetch_codeforces_rating() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/user.info")
            .match_query(Matcher::UrlEncoded("handles".into(), "alice".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"OK","result":[{"handle":"alice","rating":1600}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ProviderClient::new()
            .with_base_urls(format!("{}/api/user.info", server.url()), server.url());

        assert_eq!(client.fetch_rating(Provider::Codeforces, "alice").await, Some(1600));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_codechef_rating() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/bob")
            .with_status(200)
            .with_body(r#"{"success":true,"currentRating":"1889"}"#)
            .create_async()
            .await;

        let client = ProviderClient::new().with_base_urls(server.url(), server.url());

        assert_eq!(client.fetch_rating(Provider::CodeChef, "bob").await, Some(1889));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bob")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = ProviderClient::new().with_base_urls(server.url(), server.url());
        let result = client
            .try_fetch(Provider::CodeChef, "bob", &CancellationToken::new())
            .await;

        match result {
            Err(FetchError::Http(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("Expected Http error, got {:?}", other),
        }
        assert_eq!(client.fetch_rating(Provider::CodeChef, "bob").await, None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_absent() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bob")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = ProviderClient::new().with_base_urls(server.url(), server.url());
        let result = client
            .try_fetch(Provider::CodeChef, "bob", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = ProviderClient::new()
            .with_base_urls("http://127.0.0.1:1/api/user.info", "http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));

        let result = client
            .try_fetch(Provider::Codeforces, "alice", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_timeout() {
        let url = silent_server().await;
        let client = ProviderClient::new()
            .with_base_urls(url.clone(), url)
            .with_timeout(Duration::from_millis(200));

        let result = client
            .try_fetch(Provider::CodeChef, "bob", &CancellationToken::new())
            .await;

        match result {
            Err(e @ FetchError::Timeout(_)) => assert!(e.to_string().contains("timed out")),
            other => panic!("Expected Timeout error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_request() {
        let url = silent_server().await;
        let client = ProviderClient::new().with_base_urls(url.clone(), url);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.try_fetch(Provider::CodeChef, "bob", &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn test_probe_reports_raw_payload() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/user.info")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"status":"FAILED","comment":"handles: User with handle ghost not found"}"#)
            .create_async()
            .await;

        let client = ProviderClient::new()
            .with_base_urls(format!("{}/api/user.info", server.url()), server.url());
        let probe = client.probe(Provider::Codeforces, "ghost").await;

        assert!(!probe.success);
        assert_eq!(probe.status, Some(400));
        assert!(probe.data.is_some());
        assert!(probe.error.unwrap().contains("400"));
    }

    #[tokio::test]
    async fn test_probe_success() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bob")
            .with_status(200)
            .with_body(r#"{"success":true,"currentRating":1889}"#)
            .create_async()
            .await;

        let client = ProviderClient::new().with_base_urls(server.url(), server.url());
        let probe = client.probe(Provider::CodeChef, "bob").await;

        assert!(probe.success);
        assert_eq!(probe.rating, Some(1889));
        assert!(probe.error.is_none());
    }
}
