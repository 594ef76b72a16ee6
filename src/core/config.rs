use crate::core::kernel::signer::SignatureEncoding;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Production REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://open-api.bingx.com";

/// Default HTTP timeout for signed calls
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub base_url: Option<String>,
    pub source_key: Option<String>,
    pub signature_encoding: SignatureEncoding,
    pub timeout_seconds: u64,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("source_key", &self.source_key)?;
        state.serialize_field("signature_encoding", &self.signature_encoding)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            source_key: Option<String>,
            #[serde(default)]
            signature_encoding: SignatureEncoding,
            #[serde(default = "default_timeout")]
            timeout_seconds: u64,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            base_url: helper.base_url,
            source_key: helper.source_key,
            signature_encoding: helper.signature_encoding,
            timeout_seconds: helper.timeout_seconds,
        })
    }
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl ClientConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: None,
            source_key: None,
            signature_encoding: SignatureEncoding::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BINGX_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY` (e.g., `BINGX_SECRET_KEY`)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_SOURCE_KEY` (optional)
    /// - `{PREFIX}_SIGNATURE_ENCODING` (optional, `hex` or `base64`)
    /// - `{PREFIX}_TIMEOUT_SECONDS` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let signature_encoding = match env::var(format!("{}_SIGNATURE_ENCODING", prefix)) {
            Ok(value) => value.parse()?,
            Err(_) => SignatureEncoding::default(),
        };

        let timeout_seconds = match env::var(format!("{}_TIMEOUT_SECONDS", prefix)) {
            Ok(value) => value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!(
                    "Invalid timeout '{}': {}",
                    value, e
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECONDS,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            source_key: env::var(format!("{}_SOURCE_KEY", prefix))
                .ok()
                .filter(|key| !key.is_empty()),
            signature_encoding,
            timeout_seconds,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no file, fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Check if this configuration has credentials for signed calls
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the `X-SOURCE-KEY` header value
    #[must_use]
    pub fn source_key(mut self, source_key: String) -> Self {
        self.source_key = Some(source_key).filter(|key| !key.is_empty());
        self
    }

    #[must_use]
    pub const fn signature_encoding(mut self, encoding: SignatureEncoding) -> Self {
        self.signature_encoding = encoding;
        self
    }

    #[must_use]
    pub const fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Base URL in effect for REST calls
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_secrets() {
        let config = ClientConfig::new("key".to_string(), "secret".to_string())
            .source_key("partner".to_string());
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("\"secret\""));
        assert!(json.contains("partner"));
        assert!(json.contains("\"base64\""));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_key":"k","secret_key":"s","signature_encoding":"hex"}"#)
                .unwrap();

        assert_eq!(config.api_key(), "k");
        assert_eq!(config.signature_encoding, SignatureEncoding::Hex);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_empty_source_key_is_dropped() {
        let config = ClientConfig::new("k".to_string(), "s".to_string()).source_key(String::new());
        assert!(config.source_key.is_none());
    }

    #[test]
    fn test_has_credentials() {
        assert!(ClientConfig::new("k".to_string(), "s".to_string()).has_credentials());
        assert!(!ClientConfig::new(String::new(), "s".to_string()).has_credentials());
    }

    #[test]
    fn test_from_env_rejects_unknown_encoding() {
        env::set_var("CFGTEST_API_KEY", "k");
        env::set_var("CFGTEST_SECRET_KEY", "s");
        env::set_var("CFGTEST_SIGNATURE_ENCODING", "rot13");

        let result = ClientConfig::from_env("cfgtest");
        assert!(matches!(result, Err(ConfigError::InvalidConfiguration(_))));

        env::set_var("CFGTEST_SIGNATURE_ENCODING", "HEX");
        let config = ClientConfig::from_env("cfgtest").unwrap();
        assert_eq!(config.signature_encoding, SignatureEncoding::Hex);
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = ClientConfig::from_env("definitely_unset_prefix");
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvironmentVariable(var)) if var == "DEFINITELY_UNSET_PREFIX_API_KEY"
        ));
    }
}
