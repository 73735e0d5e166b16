use hmac::{Hmac, Mac};
use sha2::Sha256;

use aerobook_core::EngineError;

type HmacSha256 = Hmac<Sha256>;

/// Checks the X-Razorpay-Signature header: a hex HMAC-SHA256 of the raw
/// request body, keyed with the webhook secret from the provider dashboard.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Verify a signature against the raw payload. Comparison happens on the
    /// decoded bytes in constant time.
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> Result<(), EngineError> {
        let expected = hex::decode(signature_hex).map_err(|_| EngineError::InvalidSignature)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| EngineError::InvalidSignature)?;
        mac.update(payload);
        mac.verify_slice(&expected).map_err(|_| EngineError::InvalidSignature)
    }

    /// Hex signature for a payload. Used by tests and local tooling to forge
    /// provider callbacks.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector_verifies() {
        // RFC-style reference vector for HMAC-SHA256
        let verifier = WebhookVerifier::new("key");
        let payload = b"The quick brown fox jumps over the lazy dog";
        let signature = "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8";

        assert_eq!(verifier.sign(payload), signature);
        assert!(verifier.verify(payload, signature).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let payload = br#"{"event":"payment.captured"}"#;
        let signature = WebhookVerifier::new("other_secret").sign(payload);

        assert!(verifier.verify(payload, &signature).is_err());
    }

    #[test]
    fn test_modified_payload_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let signature = verifier.sign(br#"{"amount":100}"#);

        assert!(verifier.verify(br#"{"amount":999}"#, &signature).is_err());
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let payload = b"payload";

        assert!(verifier.verify(payload, "").is_err());
        assert!(verifier.verify(payload, "not-hex-at-all").is_err());
        assert!(verifier.verify(payload, "deadbeef").is_err());
    }

    #[test]
    fn test_empty_payload_still_signs() {
        let verifier = WebhookVerifier::new("whsec_test");
        let signature = verifier.sign(b"");
        assert!(verifier.verify(b"", &signature).is_ok());
        assert!(verifier.verify(b"x", &signature).is_err());
    }
}
