//! Credit-gated search executor.
//!
//! Orchestrates the search workflow: validate, charge one credit, store the
//! upload, call the provider, log the outcome. The only paths that touch the
//! balance are "successful debit" and "debit then refund"; a never-debited
//! request is never refunded.
//!
//! The refund after a post-charge failure is best-effort compensation, not a
//! two-phase commit: a crash between the debit and the refund attempt can
//! leave a transient under-refund. A refund failure is logged with full
//! context and swallowed so the caller still sees the original failure.

use imglens_core::{
    is_allowed_content_type, Account, SearchLogEntry, SearchResult, MAX_UPLOAD_BYTES, SEARCH_COST,
};
use imglens_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Workflow stage, recorded in error telemetry to attribute where a failure
/// occurred. Never user-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request accepted, nothing done yet.
    Init,
    /// Input validation (no balance effect).
    Validate,
    /// Conditional debit of the search cost.
    Charge,
    /// Upload to the object store.
    Upload,
    /// External provider lookup.
    Provider,
    /// Search log append.
    Log,
}

/// The asset to search: an uploaded file or an already-public URL.
#[derive(Debug)]
pub enum SearchInput {
    /// Uploaded image bytes with their declared content type.
    Upload {
        /// The raw file bytes.
        bytes: Vec<u8>,
        /// The declared content type.
        content_type: String,
    },
    /// A caller-supplied public image URL (skips the upload stage).
    Url(String),
}

/// Successful search outcome returned to the handler.
#[derive(Debug)]
pub struct SearchSuccess {
    /// Provider matches.
    pub results: Vec<SearchResult>,
    /// Credits retained for this search.
    pub cost: i64,
    /// Balance after the charge.
    pub remaining_credits: i64,
}

/// Validate the input before any balance mutation.
///
/// Validation failures must never debit, so this runs strictly before the
/// charge stage.
fn validate(input: &SearchInput) -> Result<(), ApiError> {
    match input {
        SearchInput::Upload {
            bytes,
            content_type,
        } => {
            if !is_allowed_content_type(content_type) {
                return Err(ApiError::UnsupportedMediaType(content_type.clone()));
            }
            if bytes.is_empty() {
                return Err(ApiError::InvalidInput("empty file upload".into()));
            }
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::PayloadTooLarge {
                    limit: MAX_UPLOAD_BYTES,
                });
            }
            Ok(())
        }
        SearchInput::Url(url) => {
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(())
            } else {
                Err(ApiError::InvalidInput("imageUrl must be an http(s) URL".into()))
            }
        }
    }
}

/// Run the full charge-act-log workflow for one search.
pub async fn run_search(
    state: &AppState,
    account: &Account,
    input: SearchInput,
) -> Result<SearchSuccess, ApiError> {
    let user_id = account.user_id;

    validate(&input)?;

    // Conditional debit: the guard failure maps to "payment required" and
    // produces no log entry and no further work.
    let balance_after_charge = state.store.debit(&user_id, SEARCH_COST)?;

    // Everything past this point is charged; failures compensate.
    let image_url = match input {
        SearchInput::Url(url) => url,
        SearchInput::Upload {
            bytes,
            content_type,
        } => match state.objects.put(bytes, &content_type).await {
            Ok(url) => url,
            Err(e) => {
                return Err(fail_charged(
                    state,
                    &user_id,
                    Stage::Upload,
                    None,
                    &e.to_string(),
                ));
            }
        },
    };

    let results = match state.provider.lookup(&image_url).await {
        Ok(results) => results,
        Err(e) => {
            return Err(fail_charged(
                state,
                &user_id,
                Stage::Provider,
                Some(&image_url),
                &e.to_string(),
            ));
        }
    };

    let entry = SearchLogEntry::success(user_id, image_url);
    if let Err(e) = state.store.record_search(&entry) {
        // The user was charged and has results; a lost audit row is logged
        // but does not fail the request.
        tracing::error!(
            user_id = %user_id,
            stage = ?Stage::Log,
            error = %e,
            "Failed to append success search log entry"
        );
    }

    Ok(SearchSuccess {
        results,
        cost: SEARCH_COST,
        remaining_credits: balance_after_charge,
    })
}

/// Compensate a post-charge failure: best-effort refund plus a `failed`
/// zero-cost log entry, then a generic retryable error for the caller.
fn fail_charged(
    state: &AppState,
    user_id: &imglens_core::UserId,
    stage: Stage,
    image_url: Option<&str>,
    cause: &str,
) -> ApiError {
    tracing::error!(
        user_id = %user_id,
        stage = ?stage,
        charged = true,
        image_url = ?image_url,
        error = %cause,
        "Search failed after charge"
    );

    let refunded = match state.store.credit(user_id, SEARCH_COST) {
        Ok(balance) => {
            tracing::info!(user_id = %user_id, balance = %balance, "Search charge refunded");
            true
        }
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                stage = ?stage,
                error = %e,
                "Refund after failed search could not be applied"
            );
            false
        }
    };

    let entry = SearchLogEntry::failed(*user_id, image_url.unwrap_or_default().to_string());
    if let Err(e) = state.store.record_search(&entry) {
        tracing::error!(
            user_id = %user_id,
            error = %e,
            "Failed to append failed search log entry"
        );
    }

    ApiError::SearchFailed { refunded }
}
