//! Daily check-in handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use imglens_core::{checkin_day, next_reset_at, CHECKIN_REWARD};
use imglens_store::{CheckinOutcome, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;

/// Check-in claim response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinResponse {
    /// Whether a check-in record now exists for today.
    pub checked_in: bool,
    /// Whether this request found an existing record instead of creating one.
    pub already_checked_in: bool,
    /// Current credit balance.
    pub credits: i64,
    /// The UTC day that was claimed.
    pub checkin_day: String,
    /// When the day rolls over and a new claim becomes available.
    pub next_reset_at: DateTime<Utc>,
}

/// `POST /v1/checkin`
pub async fn claim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CheckinResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let now = Utc::now();
    let day = checkin_day(now);

    let (already, credits) = match state
        .store
        .claim_checkin(&account.user_id, &day, CHECKIN_REWARD)?
    {
        CheckinOutcome::Claimed { balance } => {
            tracing::info!(
                user_id = %account.user_id,
                day = %day,
                balance = %balance,
                "Check-in reward granted"
            );
            (false, balance)
        }
        CheckinOutcome::Already => (true, account.credits),
    };

    Ok(Json(CheckinResponse {
        checked_in: true,
        already_checked_in: already,
        credits,
        checkin_day: day,
        next_reset_at: next_reset_at(now),
    }))
}

/// Check-in status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinStatusResponse {
    /// Whether today's reward is already claimed.
    pub checked_in_today: bool,
    /// The current UTC day.
    pub checkin_day: String,
    /// When the day rolls over.
    pub next_reset_at: DateTime<Utc>,
}

/// `GET /v1/checkin/status`
pub async fn status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CheckinStatusResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let now = Utc::now();
    let day = checkin_day(now);
    let checked_in_today = state.store.has_checkin(&account.user_id, &day)?;

    Ok(Json(CheckinStatusResponse {
        checked_in_today,
        checkin_day: day,
        next_reset_at: next_reset_at(now),
    }))
}
