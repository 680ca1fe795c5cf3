//! `RocksDB` storage layer for imglens.
//!
//! This crate owns every correctness-critical mutation in the system: the
//! credit ledger (guarded debit, unconditional credit) and the three
//! idempotent flows keyed on uniqueness (payment session ids, check-in days,
//! referral invitees).
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: account records, keyed by `user_id`
//! - `payments` / `payments_by_user`: completed payments, keyed by checkout
//!   session id (the webhook dedup key) plus a per-user index
//! - `search_log`: append-only search attempts, keyed `user_id || entry_id`
//! - `checkins`: one row per `(user_id, day)`
//! - `referral_codes` / `referral_codes_by_user`: shareable codes
//! - `referrals`: one row per invitee
//!
//! # Atomicity
//!
//! Compound operations (debit, `apply_payment`, `claim_checkin`,
//! `claim_referral`, account creation) are atomic with respect to every
//! other store operation: `RocksStore` serializes their read-check-write
//! sections behind an internal write lock and commits each with a single
//! `WriteBatch`. Callers never race between a check and its insert, and
//! never observe a partially applied compound operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use imglens_core::{
    Account, PaymentTransaction, ReferralCode, ReferralRecord, SearchLogEntry, UserId,
};

/// Outcome of applying a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The account was credited and the payment recorded.
    Applied {
        /// New balance after the credit.
        balance: i64,
    },
    /// A payment with this session id was already processed; nothing changed.
    Duplicate,
    /// The target account does not exist; nothing changed.
    AccountMissing,
}

/// Outcome of a daily check-in claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinOutcome {
    /// First claim for this day; the reward was credited.
    Claimed {
        /// New balance after the reward.
        balance: i64,
    },
    /// A check-in for this (account, day) already exists; nothing changed.
    Already,
}

/// Outcome of a referral claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// The referral was recorded and the inviter credited.
    Claimed {
        /// The inviter who received the reward.
        inviter: UserId,
        /// The inviter's balance after the reward.
        inviter_balance: i64,
    },
    /// The invitee already has a referral record; nothing changed.
    AlreadyClaimed,
    /// The invitee has prior search or payment activity and is not a
    /// genuinely new account; nothing changed.
    NotEligible,
    /// The code belongs to the invitee themselves.
    SelfReferral,
    /// No such referral code exists.
    UnknownCode,
}

/// The storage trait defining all database operations.
///
/// This abstracts the storage layer, allowing different implementations
/// (e.g. `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Resolve an account for an authenticated principal, creating one with
    /// the signup credit grant on first sight. A changed email is refreshed.
    ///
    /// Returns the account and whether it was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_or_create_account(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> Result<(Account, bool)>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Atomically decrement the balance by `amount`, only if the current
    /// balance covers it. Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the guard fails; the balance
    ///   is unchanged and never goes negative.
    fn debit(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    /// Atomically increment the balance by `amount`, unconditionally.
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn credit(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    // =========================================================================
    // Search Log Operations
    // =========================================================================

    /// Append one search log entry. The log is never mutated afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn record_search(&self, entry: &SearchLogEntry) -> Result<()>;

    /// List a user's search log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_searches(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchLogEntry>>;

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Apply a payment confirmation exactly once per session id: if a record
    /// with this session id exists the call is a no-op (`Duplicate`);
    /// otherwise the account is credited and the record inserted in one
    /// atomic unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn apply_payment(&self, payment: &PaymentTransaction) -> Result<PaymentOutcome>;

    /// Get a payment record by checkout session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment(&self, session_id: &str) -> Result<Option<PaymentTransaction>>;

    // =========================================================================
    // Reward Operations
    // =========================================================================

    /// Claim the daily check-in reward: insert-if-absent on `(user, day)`
    /// plus the reward credit, in one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn claim_checkin(&self, user_id: &UserId, day: &str, reward: i64) -> Result<CheckinOutcome>;

    /// Whether a check-in record exists for `(user, day)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_checkin(&self, user_id: &UserId, day: &str) -> Result<bool>;

    /// Get the user's referral code, creating one lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_or_create_referral_code(&self, user_id: &UserId) -> Result<ReferralCode>;

    /// Look up a referral code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_referral_code(&self, code: &str) -> Result<Option<ReferralCode>>;

    /// Claim a referral for `invitee` using `code`. Every eligibility check
    /// (unknown code, self-referral, existing referral record, prior search
    /// or payment activity) and the record insert plus inviter credit happen
    /// inside one atomic unit, so two concurrent claims cannot both pass the
    /// "no existing referral" check.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn claim_referral(&self, code: &str, invitee: &UserId, reward: i64)
        -> Result<ReferralOutcome>;

    /// Get the referral record for an invitee.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral(&self, invitee: &UserId) -> Result<Option<ReferralRecord>>;
}
