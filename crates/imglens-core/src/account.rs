//! Account types for imglens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to a freshly created account.
pub const SIGNUP_CREDITS: i64 = 3;

/// A user account holding the credit balance.
///
/// Created on first authenticated access and mutated by every
/// credit-affecting operation. Accounts are never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The user ID (identity provider subject).
    pub user_id: UserId,

    /// Email from the identity provider, refreshed when it changes.
    pub email: Option<String>,

    /// Stripe customer ID, assigned lazily on first checkout.
    pub stripe_customer_id: Option<String>,

    /// Current credit balance. Kept non-negative by the guarded debit.
    pub credits: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the signup credit grant.
    #[must_use]
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            stripe_customer_id: None,
            credits: SIGNUP_CREDITS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a debit of `amount`.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credits >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_signup_credits() {
        let account = Account::new(UserId::generate(), None);
        assert_eq!(account.credits, SIGNUP_CREDITS);
        assert!(account.stripe_customer_id.is_none());
    }

    #[test]
    fn account_sufficient_credits() {
        let mut account = Account::new(UserId::generate(), None);
        account.credits = 2;

        assert!(account.has_sufficient_credits(1));
        assert!(account.has_sufficient_credits(2));
        assert!(!account.has_sufficient_credits(3));
    }

    #[test]
    fn account_serde_roundtrip() {
        let account = Account::new(UserId::generate(), Some("a@example.com".into()));
        let json = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.user_id, account.user_id);
        assert_eq!(parsed.email, account.email);
        assert_eq!(parsed.credits, account.credits);
    }
}
