use serde_json::Value;
use thiserror::Error;

const UNKNOWN_API_ERROR: &str = "Unknown API error";

#[derive(Error, Debug)]
pub enum BingxError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, raw: String },

    #[error("Authentication error: {message}")]
    AuthError { message: String, response: Value },

    #[error("Rate limit exceeded: {message}")]
    RateLimitError { message: String, response: Value },

    #[error("Insufficient balance: {message}")]
    InsufficientBalance { message: String, response: Value },

    #[error("API error [{code}]: {message}")]
    ApiError {
        code: String,
        message: String,
        response: Value,
    },

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Frame decode error: {0}")]
    DecodeError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BingxError>;

/// Render a venue `code` field as text; numeric and string codes compare equal.
pub(crate) fn code_string(code: &Value) -> Option<String> {
    match code {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl BingxError {
    /// Classify a decoded response envelope.
    ///
    /// Returns `None` when the envelope carries no `code` field or a zero code,
    /// otherwise the single typed error matching the venue code.
    pub fn from_response(response: &Value) -> Option<Self> {
        let code = code_string(response.get("code")?)?;

        if code == "0" {
            return None;
        }

        let message = response
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_API_ERROR)
            .to_string();
        let response = response.clone();

        Some(match code.as_str() {
            "100001" | "100002" | "100003" | "100004" => Self::AuthError { message, response },
            "100005" => Self::RateLimitError { message, response },
            "200001" => Self::InsufficientBalance { message, response },
            _ => Self::ApiError {
                code,
                message,
                response,
            },
        })
    }

    /// Check if the caller may retry the failed call as-is
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_)
                | Self::RateLimitError { .. }
                | Self::ConnectionTimeout(_)
                | Self::WebSocketError(_)
        )
    }

    /// Check if the venue rejected the credentials or the signature
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthError { .. })
    }

    /// The venue's error code, when the venue produced one
    pub fn api_code(&self) -> Option<String> {
        match self {
            Self::ApiError { code, .. } => Some(code.clone()),
            _ => self
                .response()
                .and_then(|response| response.get("code"))
                .and_then(code_string),
        }
    }

    /// The raw envelope attached to a venue-classified error
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::AuthError { response, .. }
            | Self::RateLimitError { response, .. }
            | Self::InsufficientBalance { response, .. }
            | Self::ApiError { response, .. } => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_code_is_not_an_error() {
        assert!(BingxError::from_response(&json!({"data": {"price": "1"}})).is_none());
    }

    #[test]
    fn test_zero_code_is_success() {
        assert!(BingxError::from_response(&json!({"code": 0, "msg": ""})).is_none());
        assert!(BingxError::from_response(&json!({"code": "0"})).is_none());
    }

    #[test]
    fn test_auth_codes() {
        for code in [100_001, 100_002, 100_003, 100_004] {
            let err = BingxError::from_response(&json!({"code": code, "msg": "bad sig"}));
            match err {
                Some(BingxError::AuthError { message, .. }) => assert_eq!(message, "bad sig"),
                other => panic!("Expected auth error for {}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_rate_limit_and_balance_codes() {
        let err = BingxError::from_response(&json!({"code": 100_005, "msg": "slow down"}));
        assert!(matches!(err, Some(BingxError::RateLimitError { .. })));

        let err = BingxError::from_response(&json!({"code": 200_001, "msg": "no funds"}));
        assert!(matches!(err, Some(BingxError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_other_codes_keep_venue_code() {
        let err = BingxError::from_response(&json!({"code": 90001, "msg": "x"})).unwrap();
        assert_eq!(err.api_code().as_deref(), Some("90001"));
        assert_eq!(err.to_string(), "API error [90001]: x");

        let err = BingxError::from_response(&json!({"code": "80012"})).unwrap();
        match err {
            BingxError::ApiError { code, message, .. } => {
                assert_eq!(code, "80012");
                assert_eq!(message, "Unknown API error");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_helpers() {
        let auth = BingxError::from_response(&json!({"code": 100_001})).unwrap();
        assert!(auth.is_auth_error());
        assert!(!auth.is_retryable());
        assert!(auth.response().is_some());
        assert_eq!(auth.api_code().as_deref(), Some("100001"));

        let rate = BingxError::from_response(&json!({"code": 100_005})).unwrap();
        assert!(rate.is_retryable());
        assert!(BingxError::ConnectionTimeout("handshake".to_string()).is_retryable());
    }
}
