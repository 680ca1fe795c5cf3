//! Identity resolution.
//!
//! Maps an authenticated principal to an internal account row, creating one
//! with the signup credit grant on first sight. Absence of a principal never
//! reaches this module; the [`crate::auth::AuthUser`] extractor already
//! rejected the request with `Unauthorized`.

use imglens_core::Account;
use imglens_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the account for an authenticated principal, creating it on first
/// sight and refreshing a changed email.
pub fn resolve_or_create(state: &AppState, auth: &AuthUser) -> Result<Account, ApiError> {
    let (account, created) = state
        .store
        .get_or_create_account(&auth.user_id, auth.email.as_deref())?;

    if created {
        tracing::info!(
            user_id = %auth.user_id,
            credits = %account.credits,
            "Account created on first sight"
        );
    }

    Ok(account)
}
