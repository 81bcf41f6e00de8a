/*
[INPUT]:  Request method/path/body, timestamp, and a loaded signing key
[OUTPUT]: Base64-encoded request signatures
[POS]:    Auth layer - cryptographic signing for login and REST requests
[UPDATE]: When changing signing algorithm or key format
*/

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer as _, SigningKey};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::http::{BitgetError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme selected once at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignScheme {
    /// HMAC-SHA256 over the request content with a shared secret
    HmacSha256,
    /// Ed25519 over the request content with a private key
    Ed25519,
}

/// Signs authentication and REST request content.
///
/// The signed content is `"{timestamp}{method}{path}{body}"` and the
/// signature is base64-encoded, for both schemes.
pub struct Signer {
    inner: SignerInner,
}

enum SignerInner {
    Hmac { secret: Vec<u8> },
    Ed25519 { key: Box<SigningKey> },
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.inner {
            SignerInner::Hmac { .. } => SignScheme::HmacSha256,
            SignerInner::Ed25519 { .. } => SignScheme::Ed25519,
        };
        f.debug_struct("Signer")
            .field("scheme", &scheme)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Signer {
    /// Load a signer from the configured secret key.
    ///
    /// The HMAC scheme takes the secret as raw text. The Ed25519 scheme takes
    /// a base64-encoded 32-byte seed. An absent or malformed key fails with
    /// [`BitgetError::Signing`].
    pub fn new(scheme: SignScheme, secret_key: &str) -> Result<Self> {
        if secret_key.is_empty() {
            return Err(BitgetError::Signing("empty secret key".to_string()));
        }

        let inner = match scheme {
            SignScheme::HmacSha256 => SignerInner::Hmac {
                secret: secret_key.as_bytes().to_vec(),
            },
            SignScheme::Ed25519 => {
                let bytes = BASE64.decode(secret_key).map_err(|e| {
                    BitgetError::Signing(format!("secret key is not valid base64: {e}"))
                })?;
                let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    BitgetError::Signing(format!(
                        "ed25519 seed must be 32 bytes, got {}",
                        bytes.len()
                    ))
                })?;
                SignerInner::Ed25519 {
                    key: Box::new(SigningKey::from_bytes(&seed)),
                }
            }
        };

        Ok(Self { inner })
    }

    /// Sign a request. Deterministic given inputs and the loaded key.
    pub fn sign(&self, method: &str, path: &str, body: &str, timestamp_ms: i64) -> String {
        let content = format!("{timestamp_ms}{method}{path}{body}");
        match &self.inner {
            SignerInner::Hmac { secret } => {
                let mut mac = HmacSha256::new_from_slice(secret)
                    .expect("HMAC accepts keys of any length");
                mac.update(content.as_bytes());
                BASE64.encode(mac.finalize().into_bytes())
            }
            SignerInner::Ed25519 { key } => {
                BASE64.encode(key.sign(content.as_bytes()).to_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use rstest::rstest;

    use super::*;

    const ED25519_SEED_B64: &str = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=";

    #[test]
    fn test_empty_key_rejected() {
        let err = Signer::new(SignScheme::HmacSha256, "").unwrap_err();
        assert!(matches!(err, BitgetError::Signing(_)));
    }

    #[rstest]
    #[case("not base64!!")]
    #[case("c2hvcnQ=")] // valid base64, wrong length
    fn test_malformed_ed25519_seed_rejected(#[case] seed: &str) {
        let err = Signer::new(SignScheme::Ed25519, seed).unwrap_err();
        assert!(matches!(err, BitgetError::Signing(_)));
    }

    #[test]
    fn test_hmac_sign_deterministic() {
        let signer = Signer::new(SignScheme::HmacSha256, "secret").unwrap();
        let a = signer.sign("GET", "/user/verify", "", 1_700_000_000_000);
        let b = signer.sign("GET", "/user/verify", "", 1_700_000_000_000);
        assert_eq!(a, b);

        let decoded = BASE64.decode(&a).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn test_hmac_sign_varies_with_inputs() {
        let signer = Signer::new(SignScheme::HmacSha256, "secret").unwrap();
        let other_key = Signer::new(SignScheme::HmacSha256, "other").unwrap();

        let base = signer.sign("GET", "/user/verify", "", 1_700_000_000_000);
        assert_ne!(base, signer.sign("POST", "/user/verify", "", 1_700_000_000_000));
        assert_ne!(base, signer.sign("GET", "/user/verify", "", 1_700_000_000_001));
        assert_ne!(base, other_key.sign("GET", "/user/verify", "", 1_700_000_000_000));
    }

    #[test]
    fn test_ed25519_sign_verifies() {
        let signer = Signer::new(SignScheme::Ed25519, ED25519_SEED_B64).unwrap();
        let signature_b64 = signer.sign("GET", "/user/verify", "", 1_700_000_000_000);

        let seed: [u8; 32] = BASE64
            .decode(ED25519_SEED_B64)
            .unwrap()
            .try_into()
            .unwrap();
        let key = SigningKey::from_bytes(&seed);
        let verifying: VerifyingKey = key.verifying_key();

        let sig_bytes: [u8; 64] = BASE64
            .decode(&signature_b64)
            .unwrap()
            .try_into()
            .unwrap();
        let signature = Signature::from_bytes(&sig_bytes);
        let content = format!("{}{}{}{}", 1_700_000_000_000_i64, "GET", "/user/verify", "");
        assert!(verifying.verify(content.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer = Signer::new(SignScheme::HmacSha256, "super-secret").unwrap();
        let rendered = format!("{signer:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }
}
