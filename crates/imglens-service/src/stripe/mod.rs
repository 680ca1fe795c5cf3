//! Stripe API client.
//!
//! Covers the two calls the service needs (customer creation, Checkout
//! session creation) plus webhook signature verification. The Stripe API is
//! form-encoded with basic auth on the secret key.

pub mod types;

use std::time::Duration;

use reqwest::Client;

use imglens_core::CreditPackage;

use crate::crypto;
pub use types::{CheckoutSession, Customer, StripeErrorBody, StripeErrorResponse};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(StripeError::Http)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            webhook_secret,
        })
    }

    /// Create a new Stripe customer tagged with our internal user id.
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> Result<Customer, StripeError> {
        let mut params = vec![("metadata[user_id]", user_id.to_string())];

        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }

        let response = self
            .client
            .post(format!("{}/customers", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Create a Checkout session for a credit package purchase.
    ///
    /// The session metadata carries `user_id` and `credits`; the webhook
    /// reads those back to credit the right account.
    pub async fn create_checkout_session(
        &self,
        customer_id: Option<&str>,
        user_id: &str,
        package: &CreditPackage,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let mut params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                "imglens credits".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                format!("{} search credits", package.credits),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                package.amount_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[credits]", package.credits.to_string()),
            ("metadata[package_id]", package.id.to_string()),
        ];

        if let Some(cid) = customer_id {
            params.push(("customer", cid.to_string()));
        }

        tracing::debug!(
            user_id = %user_id,
            package_id = %package.id,
            amount_cents = %package.amount_cents,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Verify the `Stripe-Signature` header for a raw webhook payload.
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        crypto::verify_stripe_signature(
            payload,
            signature,
            secret,
            chrono::Utc::now().timestamp(),
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook signature verification failed");
            StripeError::InvalidSignature
        })
    }

    /// Handle an API response and convert error bodies.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}
