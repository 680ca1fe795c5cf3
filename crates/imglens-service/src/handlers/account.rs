//! Account and search history handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use imglens_core::SearchLogEntry;
use imglens_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;

/// Account view returned to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// The account's user id.
    pub user_id: String,
    /// Email on file, if any.
    pub email: Option<String>,
    /// Current credit balance.
    pub credits: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// `GET /v1/account`
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    Ok(Json(AccountResponse {
        user_id: account.user_id.to_string(),
        email: account.email,
        credits: account.credits,
        created_at: account.created_at,
    }))
}

/// Paging parameters for the search history.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Maximum entries to return (default 20, capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Entries to skip, newest first.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search history response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryResponse {
    /// Entries, newest first.
    pub searches: Vec<SearchLogEntry>,
}

/// `GET /v1/searches`
pub async fn list_searches(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<SearchHistoryResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let limit = params.limit.min(100);
    let searches = state
        .store
        .list_searches(&account.user_id, limit, params.offset)?;

    Ok(Json(SearchHistoryResponse { searches }))
}
