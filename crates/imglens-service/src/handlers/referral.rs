//! Referral handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use imglens_store::{ReferralOutcome, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;

/// Cookie set by the frontend when a visitor lands on a referral link.
const REFERRAL_COOKIE: &str = "imglens_ref";

/// Referral code response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCodeResponse {
    /// The shareable code.
    pub code: String,
    /// Ready-to-share link pointing at the frontend.
    pub url: String,
}

/// `GET /v1/referral/code`
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ReferralCodeResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let referral_code = state.store.get_or_create_referral_code(&account.user_id)?;
    let url = format!(
        "{}/?ref={}",
        state.config.frontend_url, referral_code.code
    );

    Ok(Json(ReferralCodeResponse {
        code: referral_code.code,
        url,
    }))
}

/// Referral claim request body. The code may instead arrive via the
/// `imglens_ref` cookie.
#[derive(Debug, Default, Deserialize)]
pub struct ClaimRequest {
    /// The referral code to claim.
    #[serde(default)]
    pub code: Option<String>,
}

/// Referral claim response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    /// Whether a referral was recorded by this request.
    pub claimed: bool,
    /// Set when the invitee already had a referral record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_claimed: Option<bool>,
    /// Credits granted to the inviter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,
    /// The inviter's balance after the reward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inviter_credits: Option<i64>,
    /// Why an otherwise-valid claim was declined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `POST /v1/referral/claim`
///
/// The invitee claims a referral; the reward goes to the inviter. A declined
/// claim (already referred, not a new account) is a distinct 200 body, not an
/// error, so frontends can silently drop the stored cookie.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Option<Json<ClaimRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let code = body
        .and_then(|Json(request)| request.code)
        .filter(|c| !c.is_empty())
        .or_else(|| cookie_value(&headers, REFERRAL_COOKIE))
        .ok_or_else(|| ApiError::InvalidInput("missing referral code".into()))?;

    let reward = imglens_core::REFERRAL_REWARD;
    match state.store.claim_referral(&code, &account.user_id, reward)? {
        ReferralOutcome::Claimed {
            inviter,
            inviter_balance,
        } => {
            tracing::info!(
                invitee = %account.user_id,
                inviter = %inviter,
                code = %code,
                reward = %reward,
                "Referral claimed"
            );
            Ok(Json(ClaimResponse {
                claimed: true,
                already_claimed: None,
                reward: Some(reward),
                inviter_credits: Some(inviter_balance),
                reason: None,
            }))
        }
        ReferralOutcome::AlreadyClaimed => Ok(Json(ClaimResponse {
            claimed: false,
            already_claimed: Some(true),
            reward: None,
            inviter_credits: None,
            reason: None,
        })),
        ReferralOutcome::NotEligible => Ok(Json(ClaimResponse {
            claimed: false,
            already_claimed: None,
            reward: None,
            inviter_credits: None,
            reason: Some("not_eligible".into()),
        })),
        ReferralOutcome::SelfReferral => {
            Err(ApiError::InvalidInput("cannot claim your own referral code".into()))
        }
        ReferralOutcome::UnknownCode => {
            Err(ApiError::InvalidInput(format!("unknown referral code: {code}")))
        }
    }
}

/// Pull a named cookie out of the `Cookie` header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("session=abc; imglens_ref=XYZ12345; theme=dark"),
        );
        assert_eq!(
            cookie_value(&headers, REFERRAL_COOKIE),
            Some("XYZ12345".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_absent() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, REFERRAL_COOKIE), None);
    }
}
