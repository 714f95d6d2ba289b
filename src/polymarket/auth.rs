use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL_SAFE},
    Engine,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid base64 secret: {0}")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("HMAC computation failed: {0}")]
    HmacError(String),
}

/// CLOB credential set. The API secret is base64-decoded once at
/// construction, so a malformed credential fails at startup rather than on
/// the first signed request.
#[derive(Clone)]
pub struct ClobAuth {
    pub api_key: String,
    pub passphrase: String,
    secret: Vec<u8>,
}

impl ClobAuth {
    /// Secrets are issued in the URL-safe base64 alphabet, but older ones
    /// used the standard alphabet; accept either.
    pub fn new(api_key: String, api_secret: &str, passphrase: String) -> Result<Self, AuthError> {
        let secret = BASE64_URL_SAFE
            .decode(api_secret)
            .or_else(|_| BASE64.decode(api_secret))?;

        Ok(Self {
            api_key,
            passphrase,
            secret,
        })
    }

    /// HMAC-SHA256 over `{timestamp}{method}{path}{body}`, base64-encoded.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<String, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::HmacError(e.to_string()))?;

        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

// Manual impl so the raw secret never lands in logs.
impl std::fmt::Debug for ClobAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClobAuth")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_secret(raw: &[u8]) -> ClobAuth {
        ClobAuth::new("key".into(), &BASE64.encode(raw), "pass".into()).unwrap()
    }

    #[test]
    fn test_malformed_secret_rejected_at_construction() {
        assert!(ClobAuth::new("key".into(), "not base64!!", "pass".into()).is_err());
    }

    #[test]
    fn test_url_safe_and_standard_secrets_accepted() {
        // 0xfb 0xef bytes force '-'/'_' vs '+'/'/' alphabet differences.
        let raw = [0xfbu8, 0xef, 0x01, 0x02, 0x03];
        let url_safe = BASE64_URL_SAFE.encode(raw);
        let standard = BASE64.encode(raw);

        let a = ClobAuth::new("key".into(), &url_safe, "pass".into()).unwrap();
        let b = ClobAuth::new("key".into(), &standard, "pass".into()).unwrap();

        // Same decoded secret, same signature.
        assert_eq!(
            a.sign("1700000000", "POST", "/order", "{}").unwrap(),
            b.sign("1700000000", "POST", "/order", "{}").unwrap()
        );
    }

    #[test]
    fn test_sign_produces_base64_output() {
        let auth = auth_with_secret(b"test-secret-key-1234");
        let sig = auth.sign("1700000000", "POST", "/order", "{}").unwrap();

        assert!(BASE64.decode(&sig).is_ok());
        // 32 HMAC bytes base64-encode to 44 chars
        assert_eq!(sig.len(), 44);
    }

    #[test]
    fn test_sign_is_deterministic_for_same_input() {
        let auth = auth_with_secret(b"another-secret");

        let a = auth.sign("1700000000", "GET", "/order/abc", "").unwrap();
        let b = auth.sign("1700000000", "GET", "/order/abc", "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = auth_with_secret(b"super-secret");
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }
}
