//! Shared-secret payload signatures
//!
//! Used to authenticate payment-provider webhook deliveries.
//!
//! # Algorithm
//!
//! HMAC-SHA256 keyed with the shared secret over the raw request body,
//! sent as lowercase hex. Verification decodes the hex and compares MACs in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing signature")]
    Missing,

    #[error("Invalid signature")]
    Invalid,
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Invalid)
}

/// Calculate the hex signature of a payload
///
/// ```
/// use gradebook_common::api::signature::calculate_signature;
///
/// let sig = calculate_signature(br#"{"event_type":"PING"}"#, "secret");
/// assert_eq!(sig.len(), 64);
/// assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn calculate_signature(payload: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length, so keying cannot fail here.
    match keyed_mac(secret) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Validate a provided hex signature against the payload
///
/// Hex decoding accepts either case.
pub fn validate_signature(
    provided: Option<&str>,
    payload: &[u8],
    secret: &str,
) -> Result<(), SignatureError> {
    let provided = provided.map(str::trim).filter(|s| !s.is_empty());
    let provided = provided.ok_or(SignatureError::Missing)?;
    let expected = hex::decode(provided).map_err(|_| SignatureError::Invalid)?;

    let mut mac = keyed_mac(secret)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event_type":"BILLING.SUBSCRIPTION.CANCELLED","resource":{"id":"I-1"}}"#;

    #[test]
    fn test_signature_is_deterministic() {
        assert_eq!(
            calculate_signature(BODY, "secret"),
            calculate_signature(BODY, "secret")
        );
    }

    #[test]
    fn test_secret_changes_signature() {
        assert_ne!(
            calculate_signature(BODY, "secret"),
            calculate_signature(BODY, "other")
        );
    }

    #[test]
    fn test_known_digest() {
        // RFC 4231 test case 2
        assert_eq!(
            calculate_signature(b"what do ya want for nothing?", "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_plain_hash_of_body_and_secret_rejected() {
        // sha256("abc"), the unkeyed digest of body "ab" followed by secret "c"
        let unkeyed = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(
            validate_signature(Some(unkeyed), b"ab", "c"),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_valid_signature_accepted_in_any_case() {
        let sig = calculate_signature(BODY, "secret");
        assert!(validate_signature(Some(&sig), BODY, "secret").is_ok());
        assert!(validate_signature(Some(&sig.to_uppercase()), BODY, "secret").is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let sig = calculate_signature(BODY, "secret");
        assert_eq!(
            validate_signature(Some(&sig), b"{}", "secret"),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_missing_signature_rejected() {
        assert_eq!(
            validate_signature(None, BODY, "secret"),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            validate_signature(Some("  "), BODY, "secret"),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_malformed_or_short_signature_rejected() {
        assert_eq!(
            validate_signature(Some("abc"), BODY, "secret"),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            validate_signature(Some("zz"), BODY, "secret"),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            validate_signature(Some("abcd"), BODY, "secret"),
            Err(SignatureError::Invalid)
        );
    }
}
