use crate::core::config::ConfigError;
use crate::core::errors::{BingxError, Result};
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Text encoding applied to the raw HMAC digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    Hex,
    #[default]
    Base64,
}

impl FromStr for SignatureEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "Unknown signature encoding '{}', expected 'hex' or 'base64'",
                other
            ))),
        }
    }
}

impl fmt::Display for SignatureEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => f.write_str("hex"),
            Self::Base64 => f.write_str("base64"),
        }
    }
}

/// Signer trait for request authentication
///
/// Implementations turn the canonical query string of a request into the
/// value sent as its `signature` parameter.
pub trait Signer: Send + Sync {
    /// API key sent in the `X-BX-APIKEY` header
    fn api_key(&self) -> &str;

    /// Sign the canonical query string
    fn sign(&self, payload: &str) -> Result<String>;
}

/// HMAC-SHA256 signer
pub struct HmacSigner {
    api_key: String,
    secret_key: Secret<String>,
    encoding: SignatureEncoding,
}

impl HmacSigner {
    /// Create a new HMAC signer
    ///
    /// # Arguments
    /// * `api_key` - API key from the venue
    /// * `secret_key` - Secret key for signing
    /// * `encoding` - How the digest is rendered
    pub fn new(api_key: String, secret_key: String, encoding: SignatureEncoding) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
            encoding,
        }
    }

    pub const fn encoding(&self) -> SignatureEncoding {
        self.encoding
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("api_key", &self.api_key)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| BingxError::SerializationError(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        let digest = mac.finalize().into_bytes();

        Ok(match self.encoding {
            SignatureEncoding::Hex => hex::encode(digest),
            SignatureEncoding::Base64 => general_purpose::STANDARD.encode(digest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published HMAC-SHA256 vector: key "key", message below
    const MESSAGE: &str = "The quick brown fox jumps over the lazy dog";
    const EXPECTED_HEX: &str = "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8";

    #[test]
    fn test_hex_signature() {
        let signer = HmacSigner::new("api".to_string(), "key".to_string(), SignatureEncoding::Hex);
        assert_eq!(signer.sign(MESSAGE).unwrap(), EXPECTED_HEX);
    }

    #[test]
    fn test_base64_signature_matches_hex_digest() {
        let signer = HmacSigner::new(
            "api".to_string(),
            "key".to_string(),
            SignatureEncoding::Base64,
        );
        let signature = signer.sign(MESSAGE).unwrap();
        let decoded = general_purpose::STANDARD.decode(signature).unwrap();
        assert_eq!(hex::encode(decoded), EXPECTED_HEX);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = HmacSigner::new("api".to_string(), "s3cr3t".to_string(), SignatureEncoding::Hex);
        let payload = "symbol=BTC-USDT&timestamp=1700000000000";
        let first = signer.sign(payload).unwrap();
        for _ in 0..5 {
            assert_eq!(signer.sign(payload).unwrap(), first);
        }
        assert_ne!(signer.sign("symbol=ETH-USDT").unwrap(), first);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("hex".parse::<SignatureEncoding>().unwrap(), SignatureEncoding::Hex);
        assert_eq!(
            "Base64".parse::<SignatureEncoding>().unwrap(),
            SignatureEncoding::Base64
        );
        assert!("sha".parse::<SignatureEncoding>().is_err());
        assert_eq!(SignatureEncoding::default(), SignatureEncoding::Base64);
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = HmacSigner::new("api".to_string(), "hidden".to_string(), SignatureEncoding::Hex);
        assert!(!format!("{:?}", signer).contains("hidden"));
    }
}
