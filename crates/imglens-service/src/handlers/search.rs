//! Reverse image search handler.
//!
//! Accepts either a multipart upload (`file` part) or a JSON body with an
//! `imageUrl` field. Everything after input extraction happens in the
//! [`crate::executor`], which owns the charge/refund semantics.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::Json;
use serde::{Deserialize, Serialize};

use imglens_core::SearchResult;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::executor::{self, SearchInput};
use crate::identity;
use crate::state::AppState;

/// JSON request body for URL-submitted searches.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlSearchRequest {
    image_url: String,
}

/// Successful search response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Provider matches.
    pub results: Vec<SearchResult>,
    /// Credits charged for this search.
    pub cost: i64,
    /// Balance after the charge.
    pub remaining_credits: i64,
}

/// `POST /v1/search`
pub async fn search(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    request: Request,
) -> Result<Json<SearchResponse>, ApiError> {
    let account = identity::resolve_or_create(&state, &auth)?;

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let input = if content_type.starts_with("multipart/form-data") {
        extract_upload(request).await?
    } else {
        extract_url(request, state.config.max_body_bytes).await?
    };

    let success = executor::run_search(&state, &account, input).await?;

    Ok(Json(SearchResponse {
        results: success.results,
        cost: success.cost,
        remaining_credits: success.remaining_credits,
    }))
}

/// Pull the `file` part out of a multipart body.
async fn extract_upload(request: Request) -> Result<SearchInput, ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::InvalidInput(format!("invalid multipart body: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::InvalidInput("file part has no content type".into()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("failed to read file part: {e}")))?;

        return Ok(SearchInput::Upload {
            bytes: bytes.to_vec(),
            content_type,
        });
    }

    Err(ApiError::InvalidInput("missing file part".into()))
}

/// Parse a JSON `{imageUrl}` body.
async fn extract_url(request: Request, body_limit: usize) -> Result<SearchInput, ApiError> {
    let bytes = axum::body::to_bytes(request.into_body(), body_limit)
        .await
        .map_err(|e| ApiError::InvalidInput(format!("failed to read request body: {e}")))?;

    let parsed: UrlSearchRequest = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::InvalidInput("expected multipart upload or {\"imageUrl\"}".into()))?;

    Ok(SearchInput::Url(parsed.image_url))
}
