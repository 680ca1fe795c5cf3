//! Stripe webhook handler.
//!
//! The webhook is the only authority for crediting purchased credits; the
//! client redirect back from Checkout never mutates balances. Signature
//! verification fails closed, and every signature-valid event is acknowledged
//! with 200 so Stripe stops retrying — including events the service skips.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use imglens_core::{PaymentTransaction, UserId};
use imglens_store::{PaymentOutcome, Store};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{CheckoutSession, StripeError};

/// Stripe event envelope.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
struct WebhookEventData {
    object: Value,
}

/// `POST /webhooks/stripe`
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let stripe = state.stripe.as_ref().ok_or(ApiError::PaymentsUnavailable)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidSignature)?;

    stripe
        .verify_webhook_signature(&body, signature)
        .map_err(|e| match e {
            // No signing secret means the endpoint cannot authenticate
            // anything; reject rather than trust unsigned input.
            StripeError::Configuration(_) => ApiError::PaymentsUnavailable,
            _ => ApiError::InvalidSignature,
        })?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidInput(format!("malformed webhook payload: {e}")))?;

    tracing::debug!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Stripe webhook received"
    );

    if event.event_type == "checkout.session.completed" {
        handle_checkout_completed(&state, &event)?;
    }

    Ok(Json(json!({ "received": true })))
}

/// Credit the account for a completed, paid checkout session.
///
/// Skipped events (unpaid session, bad metadata, missing account) are logged
/// and acknowledged; returning an error here would only make Stripe retry a
/// payload that will never become processable.
fn handle_checkout_completed(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let session: CheckoutSession = match serde_json::from_value(event.data.object.clone()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(
                event_id = %event.id,
                error = %e,
                "Checkout event object is not a session, skipping"
            );
            return Ok(());
        }
    };

    if session.payment_status.as_deref() != Some("paid") {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Checkout session not paid, skipping"
        );
        return Ok(());
    }

    let Some((user_id, credits)) = parse_session_metadata(&session) else {
        tracing::error!(
            session_id = %session.id,
            metadata = %session.metadata,
            "Checkout session metadata missing or invalid, skipping"
        );
        return Ok(());
    };

    let payment = PaymentTransaction {
        session_id: session.id.clone(),
        user_id,
        amount_cents: session.amount_total.unwrap_or(0),
        currency: "usd".into(),
        credits,
        status: "paid".into(),
        created_at: chrono::Utc::now(),
    };

    match state.store.apply_payment(&payment)? {
        PaymentOutcome::Applied { balance } => {
            tracing::info!(
                session_id = %session.id,
                user_id = %user_id,
                credits = %credits,
                balance = %balance,
                "Payment applied"
            );
        }
        PaymentOutcome::Duplicate => {
            tracing::info!(
                session_id = %session.id,
                "Payment already processed, ignoring replay"
            );
        }
        PaymentOutcome::AccountMissing => {
            tracing::error!(
                session_id = %session.id,
                user_id = %user_id,
                "Payment for unknown account, skipping"
            );
        }
    }

    Ok(())
}

/// Extract `(user_id, credits)` from session metadata. Stripe metadata
/// values are always strings.
fn parse_session_metadata(session: &CheckoutSession) -> Option<(UserId, i64)> {
    let user_id = session
        .metadata
        .get("user_id")?
        .as_str()?
        .parse::<UserId>()
        .ok()?;
    let credits = session
        .metadata
        .get("credits")?
        .as_str()?
        .parse::<i64>()
        .ok()?;
    if credits <= 0 {
        return None;
    }
    Some((user_id, credits))
}
