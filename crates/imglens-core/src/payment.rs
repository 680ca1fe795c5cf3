//! Payment records and the credit package catalogue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// One row per completed payment, keyed by the processor's checkout session
/// id. Created exactly once by the webhook handler and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// The processor's checkout session id. Deduplication key: at most one
    /// record (and one balance credit) per session id.
    pub session_id: String,

    /// The account that was credited.
    pub user_id: UserId,

    /// Amount paid, in cents.
    pub amount_cents: i64,

    /// ISO currency code (e.g. "usd").
    pub currency: String,

    /// Credits granted by this payment.
    pub credits: i64,

    /// Processor payment status at the time of processing (e.g. "paid").
    pub status: String,

    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

/// A purchasable credit package.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditPackage {
    /// Package identifier used by the checkout endpoint.
    pub id: &'static str,

    /// Credits granted on completed payment.
    pub credits: i64,

    /// Price in cents.
    pub amount_cents: i64,
}

/// The fixed credit package catalogue.
pub const CREDIT_PACKAGES: &[CreditPackage] = &[
    CreditPackage {
        id: "starter",
        credits: 100,
        amount_cents: 500,
    },
    CreditPackage {
        id: "standard",
        credits: 500,
        amount_cents: 2000,
    },
    CreditPackage {
        id: "pro",
        credits: 1500,
        amount_cents: 5000,
    },
];

impl CreditPackage {
    /// Look up a package by id.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static CreditPackage> {
        CREDIT_PACKAGES.iter().find(|p| p.id == id)
    }
}
