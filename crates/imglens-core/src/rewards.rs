//! Daily check-in and referral types.
//!
//! Both reward flows are idempotent through uniqueness keys: one check-in
//! record per (account, UTC calendar day), one referral record per invitee.

use chrono::{DateTime, Days, NaiveTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted per daily check-in.
pub const CHECKIN_REWARD: i64 = 1;

/// Credits granted to the inviter per successful referral.
pub const REFERRAL_REWARD: i64 = 20;

/// Length of generated referral codes.
const REFERRAL_CODE_LEN: usize = 8;

/// The calendar day used for check-in uniqueness, as `YYYY-MM-DD`.
///
/// Always computed in UTC regardless of caller locale; changing this would
/// change the reward cadence.
#[must_use]
pub fn checkin_day(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

/// When the current check-in day rolls over (the next UTC midnight).
///
/// # Panics
///
/// Never panics for representable `chrono` datetimes; the arithmetic only
/// fails at the far end of the supported date range.
#[must_use]
pub fn next_reset_at(now: DateTime<Utc>) -> DateTime<Utc> {
    let next_day = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .expect("date within chrono range");
    next_day
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// One row per (account, UTC day). The uniqueness of that pair is what
/// prevents a second reward on the same day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRecord {
    /// The account that checked in.
    pub user_id: UserId,

    /// UTC calendar day, `YYYY-MM-DD`.
    pub day: String,

    /// When the check-in happened.
    pub created_at: DateTime<Utc>,
}

impl CheckinRecord {
    /// Build a check-in record for the given day.
    #[must_use]
    pub fn new(user_id: UserId, day: String) -> Self {
        Self {
            user_id,
            day,
            created_at: Utc::now(),
        }
    }
}

/// A shareable referral code, created lazily for each inviter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralCode {
    /// The human-shareable code.
    pub code: String,

    /// The inviter who owns this code.
    pub owner: UserId,

    /// When the code was created.
    pub created_at: DateTime<Utc>,
}

impl ReferralCode {
    /// Create a code with fresh random content for the given owner.
    #[must_use]
    pub fn generate(owner: UserId) -> Self {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFERRAL_CODE_LEN)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect();
        Self {
            code,
            owner,
            created_at: Utc::now(),
        }
    }
}

/// One row per invitee. The uniqueness on `invitee` is what prevents an
/// account from being credited as a referral more than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralRecord {
    /// The referred account (dedup key).
    pub invitee: UserId,

    /// The account that receives the reward.
    pub inviter: UserId,

    /// The code that was used.
    pub code: String,

    /// Credits granted to the inviter.
    pub reward: i64,

    /// When the referral was granted.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn checkin_day_is_utc_date() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap();
        assert_eq!(checkin_day(t), "2024-03-05");

        let t = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
        assert_eq!(checkin_day(t), "2024-03-06");
    }

    #[test]
    fn next_reset_is_following_midnight() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let reset = next_reset_at(t);
        assert_eq!(reset, Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap());

        // Reset at the boundary moves to the next day, not the same instant.
        let midnight = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
        assert_eq!(
            next_reset_at(midnight),
            Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn referral_codes_are_distinct() {
        let owner = UserId::generate();
        let a = ReferralCode::generate(owner);
        let b = ReferralCode::generate(owner);
        assert_eq!(a.code.len(), REFERRAL_CODE_LEN);
        assert_ne!(a.code, b.code);
        assert!(a.code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
