//! Cryptographic utilities for webhook verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Tolerated clock skew between the signature timestamp and now, in seconds.
/// Events outside this window are rejected to limit replay of captured
/// payloads.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded
/// by the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Constant-time string comparison to prevent timing attacks when verifying
/// signatures.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verify a Stripe-style webhook signature header.
///
/// The header format is `t=<unix-ts>,v1=<hex sig>[,v1=<hex sig>...]`; the
/// signed message is `"{t}.{payload}"`. Any parse failure, stale timestamp,
/// or signature mismatch fails verification.
pub fn verify_stripe_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MissingTimestamp)?;

    if (now_unix - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    if signatures.is_empty() {
        return Err(SignatureError::Mismatch);
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let expected = hmac_sha256_hex(secret, &signed_payload);

    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Webhook signature verification failures.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The header carried no parseable `t=` timestamp.
    #[error("missing or invalid signature timestamp")]
    MissingTimestamp,

    /// The signature timestamp is outside the tolerance window.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    /// No candidate signature matched.
    #[error("signature mismatch")]
    Mismatch,
}
