//! Unsubscribe Tokens
//!
//! Keyed tokens binding an email address to the unsubscribe capability.
//! Token = first 32 hex chars of HMAC-SHA256(secret, normalized email). The
//! truncation keeps URLs short; a forged token can at worst unsubscribe
//! someone. The spreadsheet backend recomputes the same token independently,
//! so the normalization here (trim + lowercase) must never drift.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, StoreError};

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the full 64-char MAC.
const TOKEN_HEX_LEN: usize = 32;

/// Token issuer/verifier for a single shared secret.
#[derive(Clone)]
pub struct UnsubscribeTokens {
    secret: Vec<u8>,
}

impl UnsubscribeTokens {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    /// Issue the token for an email address.
    pub fn issue(&self, email: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| StoreError::Config("unsubscribe secret rejected by HMAC".into()))?;
        mac.update(normalize(email).as_bytes());

        let mut token = hex::encode(mac.finalize().into_bytes());
        token.truncate(TOKEN_HEX_LEN);
        Ok(token)
    }

    /// Verify a token for an email address. Returns false on any mismatch or
    /// configuration failure; never errors.
    pub fn verify(&self, email: &str, token: &str) -> bool {
        self.issue(email).map(|t| t == token).unwrap_or(false)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_is_applied() {
        let tokens = UnsubscribeTokens::new("secret");
        let a = tokens.issue(" Foo@Bar.com ").unwrap();
        let b = tokens.issue("foo@bar.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), TOKEN_HEX_LEN);
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let tokens = UnsubscribeTokens::new("secret");
        let token = tokens.issue("foo@bar.com").unwrap();
        assert!(tokens.verify("FOO@bar.com", &token));
        assert!(!tokens.verify("other@bar.com", &token));
        assert!(!tokens.verify("foo@bar.com", "deadbeefdeadbeefdeadbeefdeadbeef"));
    }

    #[test]
    fn test_different_secrets_differ() {
        let a = UnsubscribeTokens::new("secret-a");
        let b = UnsubscribeTokens::new("secret-b");
        assert_ne!(
            a.issue("foo@bar.com").unwrap(),
            b.issue("foo@bar.com").unwrap()
        );
    }
}
