//! Key encoding utilities for `RocksDB`.

use imglens_core::{EntryId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a payment key from a checkout session id.
#[must_use]
pub fn payment_key(session_id: &str) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Create a user-payment index key.
///
/// Format: `user_id (16 bytes) || session_id`.
#[must_use]
pub fn user_payment_key(user_id: &UserId, session_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + session_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(session_id.as_bytes());
    key
}

/// Create a search log key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, a user's entries sort chronologically.
#[must_use]
pub fn search_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix covering all of a user's rows in user-keyed families.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a check-in key.
///
/// Format: `user_id (16 bytes) || day ("YYYY-MM-DD")`. The key uniqueness is
/// the one-reward-per-day mechanism.
#[must_use]
pub fn checkin_key(user_id: &UserId, day: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + day.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(day.as_bytes());
    key
}

/// Create a referral code key from the code string.
#[must_use]
pub fn referral_code_key(code: &str) -> Vec<u8> {
    code.as_bytes().to_vec()
}

/// Create a referral record key from the invitee's id.
#[must_use]
pub fn referral_key(invitee: &UserId) -> Vec<u8> {
    invitee.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_length() {
        let user_id = UserId::generate();
        assert_eq!(account_key(&user_id).len(), 16);
    }

    #[test]
    fn search_entry_key_format() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = search_entry_key(&user_id, &entry_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], entry_id.to_bytes());
    }

    #[test]
    fn checkin_key_embeds_day() {
        let user_id = UserId::generate();
        let key = checkin_key(&user_id, "2024-03-05");
        assert_eq!(key.len(), 26);
        assert!(key.starts_with(user_id.as_bytes()));
        assert!(key.ends_with(b"2024-03-05"));
    }

    #[test]
    fn distinct_days_produce_distinct_keys() {
        let user_id = UserId::generate();
        assert_ne!(
            checkin_key(&user_id, "2024-03-05"),
            checkin_key(&user_id, "2024-03-06")
        );
    }
}
