//! HMAC-SHA256 outbound signing and constant-time inbound verification
//! (spec §4.11/§6), grounded in
//! `original_source/app/services/webhook_service.py`'s `sign_payload` /
//! `verify_signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute `"sha256=" + hex(HMAC_SHA256(secret, timestamp + "." + body))`.
pub fn sign(secret: &str, timestamp: &str, body: &str) -> String {
    let message = format!("{timestamp}.{body}");
    // `Hmac::new_from_slice` only fails for key lengths the algorithm
    // rejects; HMAC-SHA256 accepts any key length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify an inbound `X-Webhook-Signature` header against `secret` and the
/// raw request body, using a constant-time comparison of the decoded digest
/// bytes so timing cannot leak how many hex characters matched.
pub fn verify(secret: &str, timestamp: &str, body: &str, signature_header: &str) -> bool {
    let Some(received_hex) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(received) = hex::decode(received_hex) else {
        return false;
    };

    let message = format!("{timestamp}.{body}");
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    let expected = mac.finalize().into_bytes();

    expected.ct_eq(&received).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let signature = sign("shh", "2026-08-01T00:00:00Z", r#"{"event":"x"}"#);
        assert!(signature.starts_with("sha256="));
        assert!(verify("shh", "2026-08-01T00:00:00Z", r#"{"event":"x"}"#, &signature));
    }

    #[test]
    fn verify_rejects_tampered_body() {
        let signature = sign("shh", "2026-08-01T00:00:00Z", r#"{"event":"x"}"#);
        assert!(!verify("shh", "2026-08-01T00:00:00Z", r#"{"event":"y"}"#, &signature));
    }

    #[test]
    fn verify_rejects_missing_prefix() {
        assert!(!verify("shh", "t", "b", "deadbeef"));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let signature = sign("shh", "t", "b");
        assert!(!verify("different", "t", "b", &signature));
    }
}
