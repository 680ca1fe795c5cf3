//! Common test utilities for imglens integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;
use wiremock::MockServer;

use imglens_core::UserId;
use imglens_service::{
    create_router, crypto, AppState, HttpSearchProvider, ObjectStore, ObjectStoreError,
    SearchProvider, ServiceConfig, StripeClient,
};
use imglens_store::RocksStore;

/// Webhook signing secret shared between tests and the harnessed service.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// An object store fake that accepts every upload and returns a fixed-shape
/// public URL without network access.
pub struct FakeObjectStore;

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<String, ObjectStoreError> {
        Ok("https://cdn.test/uploads/fake.jpg".to_string())
    }
}

/// An object store fake whose uploads always fail, for refund-path tests.
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<String, ObjectStoreError> {
        Err(ObjectStoreError::Status(500))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Mock server standing in for the search provider API.
    pub provider: MockServer,
    /// Direct store handle for asserting on persisted state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and the default
    /// always-succeeding object store fake.
    pub async fn new() -> Self {
        Self::build(Arc::new(FakeObjectStore), true).await
    }

    /// Create a harness with a specific object store implementation.
    pub async fn with_objects(objects: Arc<dyn ObjectStore>) -> Self {
        Self::build(objects, true).await
    }

    /// Create a harness with Stripe left unconfigured.
    pub async fn without_stripe() -> Self {
        Self::build(Arc::new(FakeObjectStore), false).await
    }

    async fn build(objects: Arc<dyn ObjectStore>, stripe_enabled: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let provider = MockServer::start().await;

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            stripe_api_key: stripe_enabled.then(|| "sk_test_dummy".into()),
            stripe_webhook_secret: stripe_enabled.then(|| TEST_WEBHOOK_SECRET.into()),
            provider_api_url: format!("{}/reverse", provider.uri()),
            ..ServiceConfig::default()
        };

        let stripe = if stripe_enabled {
            Some(Arc::new(
                StripeClient::new("sk_test_dummy", Some(TEST_WEBHOOK_SECRET.into()))
                    .expect("Failed to create Stripe client"),
            ))
        } else {
            None
        };

        let search_provider: Arc<dyn SearchProvider> = Arc::new(HttpSearchProvider::new(
            config.provider_api_url.clone(),
            None,
        ));

        let state = AppState::with_clients(
            Arc::clone(&store),
            config,
            stripe,
            objects,
            search_provider,
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            provider,
            store,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{other_user}")
    }

    /// Build a valid `Stripe-Signature` header for a webhook payload.
    pub fn sign_webhook(payload: &str) -> String {
        let ts = chrono::Utc::now().timestamp();
        let sig = crypto::hmac_sha256_hex(TEST_WEBHOOK_SECRET, &format!("{ts}.{payload}"));
        format!("t={ts},v1={sig}")
    }
}
