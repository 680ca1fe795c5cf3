//! Core types for the imglens platform.
//!
//! This crate provides the foundational types used throughout imglens:
//!
//! - **Identifiers**: `UserId`, `EntryId`
//! - **Accounts**: `Account` and the credit constants
//! - **Search**: `SearchLogEntry`, `SearchResult`, upload validation
//! - **Payments**: `PaymentTransaction`, `CreditPackage`
//! - **Rewards**: `CheckinRecord`, `ReferralCode`, `ReferralRecord`
//!
//! # Credits
//!
//! A credit is the unit of entitlement consumed per reverse image search:
//!
//! - New accounts start with 3 free credits
//! - One search costs 1 credit (refunded if the provider call fails)
//! - Credits are purchased in fixed packages, or earned through daily
//!   check-ins and referrals
//!
//! Balances are stored as `i64` and are kept non-negative by the store's
//! guarded debit.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod ids;
pub mod payment;
pub mod rewards;
pub mod search;

pub use account::{Account, SIGNUP_CREDITS};
pub use ids::{EntryId, IdError, UserId};
pub use payment::{CreditPackage, PaymentTransaction, CREDIT_PACKAGES};
pub use rewards::{
    checkin_day, next_reset_at, CheckinRecord, ReferralCode, ReferralRecord, CHECKIN_REWARD,
    REFERRAL_REWARD,
};
pub use search::{
    is_allowed_content_type, SearchLogEntry, SearchOutcome, SearchResult, ALLOWED_CONTENT_TYPES,
    MAX_UPLOAD_BYTES, SEARCH_COST,
};
