//! Webhook Signature Verification
//!
//! Verifies the provider's `t=<epoch>,v1=<hex>` signature header against the
//! raw request body: HMAC-SHA256 over `"{t}.{body}"` with the shared webhook
//! secret, plus a timestamp tolerance window. Verified by hand rather than
//! through a provider SDK so the check stays a pure, testable function of
//! (body, header, secret, now).

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature tolerance in seconds (5 minutes)
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a webhook signature header against the raw payload.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str) -> Result<()> {
    verify_signature_at(payload, header, secret, Utc::now().timestamp())
}

fn verify_signature_at(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::SignatureInvalid("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(PaymentError::SignatureInvalid("no v1 signature".into()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::SignatureInvalid(
            "timestamp outside tolerance".into(),
        ));
    }

    let expected = compute_signature(payload, timestamp, secret)?;
    if signatures.iter().any(|sig| *sig == expected) {
        Ok(())
    } else {
        Err(PaymentError::SignatureInvalid("signature mismatch".into()))
    }
}

fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::Config("webhook secret rejected by HMAC".into()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"type":"checkout.session.completed"}"#;

    fn signed_header(payload: &[u8], timestamp: i64) -> String {
        let sig = compute_signature(payload, timestamp, SECRET).unwrap();
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_valid_signature_passes() {
        let now = 1_700_000_000;
        let header = signed_header(BODY, now);
        assert!(verify_signature_at(BODY, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_tampered_body_fails() {
        let now = 1_700_000_000;
        let header = signed_header(BODY, now);
        let err = verify_signature_at(b"{}", &header, SECRET, now).unwrap_err();
        assert!(matches!(err, PaymentError::SignatureInvalid(_)));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let now = 1_700_000_000;
        let header = signed_header(BODY, now);
        assert!(verify_signature_at(BODY, &header, "whsec_other", now).is_err());
    }

    #[test]
    fn test_stale_timestamp_fails() {
        let signed_at = 1_700_000_000;
        let header = signed_header(BODY, signed_at);
        let err =
            verify_signature_at(BODY, &header, SECRET, signed_at + 3600).unwrap_err();
        assert!(matches!(err, PaymentError::SignatureInvalid(_)));
    }

    #[test]
    fn test_garbage_header_fails() {
        let now = 1_700_000_000;
        assert!(verify_signature_at(BODY, "", SECRET, now).is_err());
        assert!(verify_signature_at(BODY, "v1=abc", SECRET, now).is_err());
        assert!(verify_signature_at(BODY, "t=123", SECRET, now).is_err());
    }
}
