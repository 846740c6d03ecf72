//! HTTP catalog backend for shift-market search.
//!
//! Provides an async GET client with a builder API and JSON handling, and a
//! [`RestCatalog`] that serves [`market_search::CatalogSource`] queries from
//! a PostgREST endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use market_data::{BackendConfig, RestCatalog};
//! use market_search::prelude::*;
//!
//! let config = BackendConfig::new("https://db.example.com/rest/v1").with_api_key(key);
//! let catalog = RestCatalog::new(&config)?;
//!
//! let request = compile(&FilterState::new().with_query("shoe"), PAGE_SIZE);
//! let page = catalog.query(&request).await?;
//! println!("{} of {}", page.rows.len(), page.total_count);
//! ```

mod catalog;
mod error;
pub mod postgrest;
mod request;
mod response;
mod retry;

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

pub use catalog::{BackendConfig, RestCatalog};
pub use error::FetchError;
pub use request::RequestBuilder;
pub use response::Response;
pub use retry::{BackoffStrategy, RetryPolicy};

/// HTTP client for outbound requests.
///
/// Wraps a shared `reqwest::Client`; cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl FetchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `base_url` to relative request URLs.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a header sent with every request.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Start a GET request. Relative URLs are joined to the base URL.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url,
        };

        let builder = RequestBuilder::new(full_url).headers(
            self.default_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        ClientRequestBuilder {
            http: self.http.clone(),
            builder,
            timeout: self.timeout,
            retry: self.retry.clone(),
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    http: reqwest::Client,
    builder: RequestBuilder,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl ClientRequestBuilder {
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.builder = self.builder.query(pairs);
        self
    }

    /// The request as built so far.
    pub fn request(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Send the request, retrying per the client's policy, and buffer the
    /// response. Non-2xx statuses are returned as responses, not errors.
    pub async fn send(self) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            match self.send_once().await {
                Ok(response) if self.retry.should_retry_status(response.status, attempt) => {
                    warn!(
                        url = %self.builder.url,
                        status = response.status,
                        attempt,
                        "retrying after server error"
                    );
                }
                Err(FetchError::Timeout) if self.retry.should_retry_timeout(attempt) => {
                    warn!(url = %self.builder.url, attempt, "retrying after timeout");
                }
                other => return other,
            }
            tokio::time::sleep(self.retry.backoff.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }

    async fn send_once(&self) -> Result<Response, FetchError> {
        let builder = &self.builder;
        let mut request = self.http.get(builder.url.as_str());
        if !builder.query.is_empty() {
            request = request.query(&builder.query);
        }
        for (key, value) in &builder.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        debug!(url = %builder.url, "sending request");
        let response = request.send().await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response::new(status, headers, body))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BackendConfig, FetchClient, FetchError, Response, RestCatalog, RetryPolicy,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_base_url_joining() {
        let client = FetchClient::new()
            .with_base_url("http://db.local/rest/v1/")
            .with_default_header("apikey", "k");

        let req = client.get("/products");
        assert_eq!(req.request().url(), "http://db.local/rest/v1/products");
        assert_eq!(req.request().get_header("apikey"), Some("k"));

        let req = client.get("https://other.example/x");
        assert_eq!(req.request().url(), "https://other.example/x");
    }

    #[tokio::test]
    async fn test_send_returns_error_statuses_as_responses() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("nope")
            .create_async()
            .await;

        let client = FetchClient::new().with_base_url(server.url());
        let response = client.get("/missing").send().await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.text().unwrap(), "nope");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = FetchClient::new()
            .with_base_url(server.url())
            .with_retry(RetryPolicy::new(2).with_backoff(BackoffStrategy::None));
        let response = client.get("/flaky").send().await.unwrap();
        assert_eq!(response.status, 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/bad")
            .with_status(400)
            .expect(1)
            .create_async()
            .await;

        let client = FetchClient::new()
            .with_base_url(server.url())
            .with_retry(RetryPolicy::new(3).with_backoff(BackoffStrategy::None));
        client.get("/bad").send().await.unwrap();
        mock.assert_async().await;
    }
}
