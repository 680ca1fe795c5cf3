//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Completed payments, keyed by the processor's checkout session id.
    /// The key uniqueness is the webhook idempotency mechanism.
    pub const PAYMENTS: &str = "payments";

    /// Index: payments by user, keyed by `user_id || session_id`.
    /// Value is empty (index only).
    pub const PAYMENTS_BY_USER: &str = "payments_by_user";

    /// Search log entries, keyed by `user_id || entry_id`.
    /// ULID entry ids keep a user's log time-ordered.
    pub const SEARCH_LOG: &str = "search_log";

    /// Check-in records, keyed by `user_id || day`. One per (account, day).
    pub const CHECKINS: &str = "checkins";

    /// Referral codes, keyed by the code string.
    pub const REFERRAL_CODES: &str = "referral_codes";

    /// Index: referral code by owner, keyed by `user_id`.
    pub const REFERRAL_CODES_BY_USER: &str = "referral_codes_by_user";

    /// Referral records, keyed by the invitee's `user_id`. One per invitee.
    pub const REFERRALS: &str = "referrals";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::PAYMENTS,
        cf::PAYMENTS_BY_USER,
        cf::SEARCH_LOG,
        cf::CHECKINS,
        cf::REFERRAL_CODES,
        cf::REFERRAL_CODES_BY_USER,
        cf::REFERRALS,
    ]
}
