//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/imglens").
    pub data_dir: String,

    /// Identity provider base URL for JWT validation.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "imglens").
    pub auth_audience: String,

    /// Stripe API key (optional; payments unavailable without it).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret (optional; the webhook endpoint
    /// rejects events until it is configured).
    pub stripe_webhook_secret: Option<String>,

    /// Frontend URL for checkout redirects and referral links.
    pub frontend_url: String,

    /// Object store endpoint for uploaded images.
    pub object_store_endpoint: String,

    /// Object store bucket name.
    pub object_store_bucket: String,

    /// Public base URL under which stored objects are reachable.
    pub object_store_public_base: String,

    /// Object store API key (optional).
    pub object_store_api_key: Option<String>,

    /// Reverse image search provider API URL.
    pub provider_api_url: String,

    /// Search provider API key (optional).
    pub provider_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes. Sized above the upload cap so
    /// multipart framing overhead does not reject a maximal image.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load Stripe secrets from file first, then fall back to env vars
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/imglens".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.imglens.app".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "imglens".into()),
            stripe_api_key,
            stripe_webhook_secret,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            object_store_endpoint: std::env::var("OBJECT_STORE_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            object_store_bucket: std::env::var("OBJECT_STORE_BUCKET")
                .unwrap_or_else(|_| "imglens-uploads".into()),
            object_store_public_base: std::env::var("OBJECT_STORE_PUBLIC_BASE")
                .unwrap_or_else(|_| "http://localhost:9000/imglens-uploads".into()),
            object_store_api_key: std::env::var("OBJECT_STORE_API_KEY").ok(),
            provider_api_url: std::env::var("PROVIDER_API_URL")
                .unwrap_or_else(|_| "https://api.serpsearch.dev/reverse".into()),
            provider_api_key: std::env::var("PROVIDER_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(12 * 1024 * 1024), // 12MB: 10MB image + multipart framing
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/stripe.json",
        "imglens/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/imglens".into(),
            auth_base_url: "https://auth.imglens.app".into(),
            auth_audience: "imglens".into(),
            stripe_api_key: None,
            stripe_webhook_secret: None,
            frontend_url: "http://localhost:3000".into(),
            object_store_endpoint: "http://localhost:9000".into(),
            object_store_bucket: "imglens-uploads".into(),
            object_store_public_base: "http://localhost:9000/imglens-uploads".into(),
            object_store_api_key: None,
            provider_api_url: "https://api.serpsearch.dev/reverse".into(),
            provider_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 12 * 1024 * 1024,
            request_timeout_seconds: 60,
        }
    }
}
