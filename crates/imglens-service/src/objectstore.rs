//! Object storage for uploaded images.
//!
//! Uploads go to an HTTP object-store gateway; the store hands back a public
//! URL that is passed on to the search provider. The trait seam exists so
//! tests can substitute a fake without network access.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

/// Error type for object store operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-success status.
    #[error("object store returned status {0}")]
    Status(u16),
}

/// Stores uploaded bytes and returns a publicly reachable URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a fresh key and return the public URL.
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ObjectStoreError>;
}

/// HTTP object-store client (S3-style keyed PUT).
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    public_base: String,
    api_key: Option<String>,
}

impl HttpObjectStore {
    /// Create a new client for the configured gateway.
    #[must_use]
    pub fn new(
        endpoint: String,
        bucket: String,
        public_base: String,
        api_key: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint,
            bucket,
            public_base,
            api_key,
        }
    }

    fn object_key(content_type: &str) -> String {
        let ext = match content_type {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        };
        format!("uploads/{}.{ext}", uuid::Uuid::new_v4())
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ObjectStoreError> {
        let key = Self::object_key(content_type);
        let url = format!(
            "{}/{}/{key}",
            self.endpoint.trim_end_matches('/'),
            self.bucket
        );

        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .body(bytes);

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, key = %key, "Object store rejected upload");
            return Err(ObjectStoreError::Status(status.as_u16()));
        }

        Ok(format!(
            "{}/{key}",
            self.public_base.trim_end_matches('/')
        ))
    }
}
