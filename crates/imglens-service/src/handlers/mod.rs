//! HTTP request handlers.

pub mod account;
pub mod checkin;
pub mod checkout;
pub mod health;
pub mod referral;
pub mod search;
pub mod webhooks;
