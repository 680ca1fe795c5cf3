//! Checkout session handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use imglens_core::CreditPackage;
use imglens_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Package id from the catalogue (`starter`, `standard`, `pro`).
    pub package_id: String,
}

/// Checkout response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Hosted checkout page to redirect the user to.
    pub url: String,
}

/// `POST /v1/checkout/session`
///
/// Creates a Stripe Checkout session for a credit package. A Stripe customer
/// is created lazily on the first purchase; losing the customer id is
/// tolerable (Stripe would create another), so the save is best-effort.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let mut account = identity::resolve_or_create(&state, &auth)?;

    let stripe = state
        .stripe
        .as_ref()
        .ok_or(ApiError::PaymentsUnavailable)?;

    let package = CreditPackage::find(&request.package_id)
        .ok_or_else(|| ApiError::InvalidInput(format!("unknown package: {}", request.package_id)))?;

    if account.stripe_customer_id.is_none() {
        match stripe
            .create_customer(&account.user_id.to_string(), account.email.as_deref())
            .await
        {
            Ok(customer) => {
                account.stripe_customer_id = Some(customer.id);
                account.updated_at = chrono::Utc::now();
                if let Err(e) = state.store.put_account(&account) {
                    tracing::error!(
                        user_id = %account.user_id,
                        error = %e,
                        "Failed to persist Stripe customer id"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %account.user_id,
                    error = %e,
                    "Stripe customer creation failed, proceeding without customer"
                );
            }
        }
    }

    let success_url = format!("{}/credits?status=success", state.config.frontend_url);
    let cancel_url = format!("{}/credits?status=cancelled", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(
            account.stripe_customer_id.as_deref(),
            &account.user_id.to_string(),
            package,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(user_id = %account.user_id, error = %e, "Checkout session creation failed");
            ApiError::ExternalService("failed to create checkout session".into())
        })?;

    let url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("checkout session has no URL".into()))?;

    tracing::info!(
        user_id = %account.user_id,
        session_id = %session.id,
        package_id = %package.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse { url }))
}
