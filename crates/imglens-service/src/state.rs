//! Application state.

use std::sync::Arc;

use imglens_store::RocksStore;

use crate::config::ServiceConfig;
use crate::objectstore::{HttpObjectStore, ObjectStore};
use crate::provider::{HttpSearchProvider, SearchProvider};
use crate::stripe::StripeClient;

/// Application state shared across handlers.
///
/// External SDK clients are constructed once here and injected, never
/// reached through ambient globals; tests substitute fakes through
/// [`AppState::with_clients`].
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Object store for uploaded images.
    pub objects: Arc<dyn ObjectStore>,

    /// Reverse image search provider.
    pub provider: Arc<dyn SearchProvider>,
}

impl AppState {
    /// Create application state with HTTP clients built from config.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key, config.stripe_webhook_secret.clone()) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - credit purchases will not be available");
        }

        let objects: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(
            config.object_store_endpoint.clone(),
            config.object_store_bucket.clone(),
            config.object_store_public_base.clone(),
            config.object_store_api_key.clone(),
        ));

        let provider: Arc<dyn SearchProvider> = Arc::new(HttpSearchProvider::new(
            config.provider_api_url.clone(),
            config.provider_api_key.clone(),
        ));

        Self {
            store,
            config,
            stripe,
            objects,
            provider,
        }
    }

    /// Create application state with explicit collaborators (for tests).
    #[must_use]
    pub fn with_clients(
        store: Arc<RocksStore>,
        config: ServiceConfig,
        stripe: Option<Arc<StripeClient>>,
        objects: Arc<dyn ObjectStore>,
        provider: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            store,
            config,
            stripe,
            objects,
            provider,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
