//! Reverse image search provider client.
//!
//! The provider is an opaque network call with a defined contract: it takes
//! a public image URL and returns matches. Non-2xx responses, malformed
//! JSON, and a payload whose `status` field is not `"success"` are all
//! provider failures; the executor refunds the charged credit on any of
//! them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use imglens_core::SearchResult;

/// Error type for provider lookups.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (network, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success HTTP status.
    #[error("provider returned status {0}")]
    Status(u16),

    /// The response body did not parse as the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The payload parsed but reported a non-success status field.
    #[error("provider reported status {0:?}")]
    Failed(String),
}

/// Performs the external reverse image lookup.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Look up matches for a publicly reachable image URL.
    async fn lookup(&self, image_url: &str) -> Result<Vec<SearchResult>, ProviderError>;
}

/// Provider response envelope.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// HTTP search provider client.
pub struct HttpSearchProvider {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpSearchProvider {
    /// Create a new client for the configured provider API.
    #[must_use]
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn lookup(&self, image_url: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let mut request = self.client.get(&self.api_url).query(&[("url", image_url)]);

        if let Some(api_key) = &self.api_key {
            request = request.query(&[("api_key", api_key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let payload: LookupResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if payload.status != "success" {
            return Err(ProviderError::Failed(payload.status));
        }

        Ok(payload.results)
    }
}
