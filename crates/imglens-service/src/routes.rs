//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, checkin, checkout, health, referral, search, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints. Search requests hold an
/// upload in memory plus two outbound HTTP calls, so the limit is modest.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## API (JWT auth)
/// - `POST /v1/search` - Run a credit-gated reverse image search
/// - `GET /v1/account` - Get the caller's account
/// - `GET /v1/searches` - List the caller's search history
/// - `POST /v1/checkout/session` - Create a Stripe Checkout session
/// - `POST /v1/checkin` - Claim the daily check-in reward
/// - `GET /v1/checkin/status` - Today's check-in status
/// - `GET /v1/referral/code` - Get/create the caller's referral code
/// - `POST /v1/referral/claim` - Claim a referral as the invitee
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe` - Stripe payment confirmations
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/search", post(search::search))
        .route("/account", get(account::get_account))
        .route("/searches", get(account::list_searches))
        .route("/checkout/session", post(checkout::create_session))
        .route("/checkin", post(checkin::claim))
        .route("/checkin/status", get(checkin::status))
        .route("/referral/code", get(referral::get_code))
        .route("/referral/claim", post(referral::claim))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - retry cadence is controlled by Stripe)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
