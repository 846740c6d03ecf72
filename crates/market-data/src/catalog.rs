//! PostgREST-backed catalog source.

use std::time::Duration;

use async_trait::async_trait;
use market_search::compiler::QueryRequest;
use market_search::normalize::RawRow;
use market_search::{CatalogSource, QueryPage, SearchError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{postgrest, FetchClient, FetchError, RetryPolicy};

/// Connection settings for the hosted catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// REST root, e.g. `https://db.example.com/rest/v1`.
    #[serde(default)]
    pub url: String,

    /// Anonymous API key. Falls back to `MARKET_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Table (or view) holding the products.
    #[serde(default = "default_table")]
    pub table: String,

    /// Column list including the ad and shop joins.
    #[serde(default = "default_select")]
    pub select: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries for 5xx responses and timeouts.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_table() -> String {
    "products".to_string()
}

fn default_select() -> String {
    "*,ads(id,is_promoted,views),shops(name,location)".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            table: default_table(),
            select: default_select(),
            timeout_ms: default_timeout_ms(),
            max_retries: 0,
        }
    }
}

impl BackendConfig {
    pub const API_KEY_ENV: &'static str = "MARKET_API_KEY";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The configured key, else the environment's.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(Self::API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.max_retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::new(self.max_retries)
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }
        if self.table.trim().is_empty() {
            return Err(FetchError::InvalidUrl("table must not be empty".into()));
        }
        Ok(())
    }
}

/// Serves catalog queries from a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: FetchClient,
    path: String,
    select: String,
}

impl RestCatalog {
    pub fn new(config: &BackendConfig) -> Result<Self, FetchError> {
        config.validate()?;

        let mut client = FetchClient::new()
            .with_base_url(config.url.clone())
            .with_default_header("Accept", "application/json")
            .with_timeout(config.timeout())
            .with_retry(config.retry_policy());
        if let Some(key) = config.resolve_api_key() {
            client = client
                .with_default_header("apikey", key.clone())
                .with_default_header("Authorization", format!("Bearer {}", key));
        }

        Ok(Self {
            client,
            path: format!("/{}", config.table.trim_matches('/')),
            select: config.select.clone(),
        })
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    async fn fetch(&self, request: &QueryRequest) -> Result<QueryPage, FetchError> {
        let mut call = self
            .client
            .get(self.path.as_str())
            .query(postgrest::render(request, &self.select));
        for (key, value) in postgrest::headers(request) {
            call = call.header(key, value);
        }

        let response = call.send().await?;

        // Past the last page: no rows, but the header still carries the total.
        if response.is_range_not_satisfiable() {
            let total = response.content_range_total().unwrap_or(0);
            debug!(start = request.range.start, total, "requested range past end");
            return Ok(QueryPage::new(Vec::new(), total));
        }

        let response = response.error_for_status()?;
        let rows: Vec<RawRow> = response.json()?;
        let total_count = match response.content_range_total() {
            Some(total) => total,
            None => {
                debug!("no exact count in response; estimating from rows");
                request.range.start + rows.len() as u64
            }
        };

        Ok(QueryPage::new(rows, total_count))
    }
}

#[async_trait]
impl CatalogSource for RestCatalog {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage, SearchError> {
        let page = self.fetch(request).await?;
        info!(
            rows = page.rows.len(),
            total = page.total_count,
            "catalog query complete"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_search::{compile, FilterState};
    use mockito::{Matcher, Server};

    fn catalog(url: String) -> RestCatalog {
        RestCatalog::new(&BackendConfig::new(url).with_api_key("anon")).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config: BackendConfig = serde_json::from_str(r#"{"url": "https://db.example"}"#).unwrap();
        assert_eq!(config.table, "products");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_policy(), RetryPolicy::none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(BackendConfig::default().validate().is_err());
        assert!(BackendConfig::new("ftp://db.example").validate().is_err());
        assert!(!BackendConfig::default().is_configured());
    }

    #[tokio::test]
    async fn test_query_sends_postgrest_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/products")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "or".into(),
                    "(name.ilike.*shoe*,description.ilike.*shoe*)".into(),
                ),
                Matcher::UrlEncoded("category".into(), r#"in.("Fashion")"#.into()),
                Matcher::UrlEncoded("order".into(), "id.desc".into()),
                Matcher::UrlEncoded("limit".into(), "12".into()),
            ]))
            .match_header("apikey", "anon")
            .match_header("authorization", "Bearer anon")
            .match_header("range", "0-11")
            .match_header("prefer", "count=exact")
            .with_status(206)
            .with_header("content-type", "application/json")
            .with_header("content-range", "0-0/25")
            .with_body(r#"[{"id": 9, "name": "Canvas Shoe", "price": 5000, "shops": [{"location": "Kano"}]}]"#)
            .create_async()
            .await;

        let state = FilterState::new().with_query("shoe").with_category("Fashion");
        let page = catalog(server.url())
            .query(&compile(&state, 12))
            .await
            .unwrap();

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total_count, 25);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_location_filter_inner_joins_shops() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/products")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "select".into(),
                    "*,ads(id,is_promoted,views),shops!inner(name,location)".into(),
                ),
                Matcher::UrlEncoded("shops.location".into(), "ilike.*Lagos*".into()),
            ]))
            .with_status(200)
            .with_header("content-range", "0-0/1")
            .with_body(r#"[{"id": 4, "shops": [{"location": "Ikeja, Lagos"}]}]"#)
            .expect(1)
            .create_async()
            .await;

        let request = compile(&FilterState::new().with_location("Lagos"), 12);
        let page = catalog(server.url()).query(&request).await.unwrap();

        assert_eq!(page.total_count, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_range_past_end_is_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/products")
            .match_query(Matcher::Any)
            .with_status(416)
            .with_header("content-range", "*/25")
            .create_async()
            .await;

        let request = compile(&FilterState::new().with_query("x").with_page(9), 12);
        let page = catalog(server.url()).query(&request).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_count, 25);
    }

    #[tokio::test]
    async fn test_backend_error_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/products")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":"42703","message":"column products.nope does not exist"}"#)
            .create_async()
            .await;

        let request = compile(&FilterState::new().with_query("x"), 12);
        let err = catalog(server.url()).query(&request).await.unwrap_err();
        assert_eq!(
            err,
            SearchError::Backend {
                status: 400,
                message: "column products.nope does not exist".into()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/products")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let request = compile(&FilterState::new().with_query("x"), 12);
        let err = catalog(server.url()).query(&request).await.unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let request = compile(&FilterState::new().with_query("x"), 12);
        let err = catalog("http://127.0.0.1:1".to_string())
            .query(&request)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
