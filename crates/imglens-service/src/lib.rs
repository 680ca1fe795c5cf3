//! imglens HTTP API service.
//!
//! This crate provides the HTTP API for imglens, a pay-per-use reverse image
//! search application:
//!
//! - Credit-gated search (charge, upload, provider lookup, audit log, refund
//!   on failure)
//! - Stripe checkout and payment-confirmation webhooks
//! - Daily check-in and referral rewards
//!
//! # Authentication
//!
//! End-user requests carry a JWT from the identity provider, validated
//! against its JWKS. The payment webhook authenticates via an HMAC
//! signature instead and is independent of any user session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Webhook handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod identity;
pub mod objectstore;
pub mod provider;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use objectstore::{HttpObjectStore, ObjectStore, ObjectStoreError};
pub use provider::{HttpSearchProvider, ProviderError, SearchProvider};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
