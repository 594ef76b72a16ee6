use crate::core::config::{ConfigError, DEFAULT_TIMEOUT_SECONDS};
use crate::core::errors::{BingxError, Result};
use crate::core::kernel::signer::Signer;
use crate::core::types::ParameterSet;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace};

const API_KEY_HEADER: &str = "X-BX-APIKEY";
const SOURCE_KEY_HEADER: &str = "X-SOURCE-KEY";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Time source for the injected `timestamp` parameter
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::cast_sign_loss)]
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// A clock frozen at one instant, for reproducible signatures
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// REST client trait for signed HTTP requests
///
/// Every call is signed. Endpoint definitions supply a method, a path and a
/// parameter set and get back the decoded JSON envelope or one typed error.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Execute one signed request and return the classified JSON envelope
    async fn request(&self, method: Method, endpoint: &str, params: ParameterSet)
        -> Result<Value>;

    /// Execute one signed request and deserialize the envelope into `T`
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: ParameterSet,
    ) -> Result<T> {
        let value = self.request(method, endpoint, params).await?;
        serde_json::from_value(value).map_err(|e| {
            BingxError::SerializationError(format!("Failed to deserialize JSON: {}", e))
        })
    }

    async fn get(&self, endpoint: &str, params: ParameterSet) -> Result<Value> {
        self.request(Method::GET, endpoint, params).await
    }

    async fn post(&self, endpoint: &str, params: ParameterSet) -> Result<Value> {
        self.request(Method::POST, endpoint, params).await
    }

    async fn put(&self, endpoint: &str, params: ParameterSet) -> Result<Value> {
        self.request(Method::PUT, endpoint, params).await
    }

    async fn delete(&self, endpoint: &str, params: ParameterSet) -> Result<Value> {
        self.request(Method::DELETE, endpoint, params).await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Optional `X-SOURCE-KEY` header value
    pub source_key: Option<String>,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: concat!("bingx-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            source_key: None,
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Empty keys are treated as unset
    pub fn with_source_key(mut self, source_key: Option<String>) -> Self {
        self.source_key = source_key.filter(|key| !key.is_empty());
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the wall clock used for `timestamp` injection
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<ReqwestRest> {
        let signer = self.signer.ok_or_else(|| {
            ConfigError::InvalidConfiguration("REST client requires a signer".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer,
            clock: self.clock,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    /// Canonical query for `params` with `signature` appended as the final pair
    pub fn signed_query(&self, params: &mut ParameterSet) -> Result<String> {
        if let Some(key) = params.non_finite_key() {
            return Err(BingxError::SerializationError(format!(
                "Parameter '{}' is not a finite number",
                key
            )));
        }

        if !params.contains_key("timestamp") {
            params.insert("timestamp", self.clock.now_millis());
        }

        let query = params.to_query_string();
        let signature = self.signer.sign(&query)?;

        Ok(url::form_urlencoded::Serializer::new(query)
            .append_pair("signature", &signature)
            .finish())
    }

    /// Decode the body and run venue error classification
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let response_text = response.text().await?;

        trace!("Response body: {}", response_text);

        let value: Value = serde_json::from_str(&response_text).map_err(|e| {
            BingxError::MalformedResponse {
                message: format!("Invalid JSON response from API: {}", e),
                raw: response_text.clone(),
            }
        })?;

        if !value.is_object() {
            return Err(BingxError::MalformedResponse {
                message: "Invalid JSON response from API: expected an object".to_string(),
                raw: response_text,
            });
        }

        if let Some(err) = BingxError::from_response(&value) {
            return Err(err);
        }

        if !status.is_success() {
            return Err(BingxError::ApiError {
                code: status.as_u16().to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string(),
                response: value,
            });
        }

        Ok(value)
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint, param_count = params.len()))]
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        mut params: ParameterSet,
    ) -> Result<Value> {
        let signed_query = self.signed_query(&mut params)?;
        let url = self.build_url(endpoint);

        let mut request = if method == Method::GET || method == Method::DELETE {
            self.client
                .request(method, format!("{}?{}", url, signed_query))
        } else {
            self.client
                .request(method, url)
                .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(signed_query)
        };

        request = request.header(API_KEY_HEADER, self.signer.api_key());
        if let Some(source_key) = &self.config.source_key {
            request = request.header(SOURCE_KEY_HEADER, source_key);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}
