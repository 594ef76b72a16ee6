use crate::core::config::ClientConfig;
use crate::core::errors::Result;
use crate::core::kernel::ReqwestRest;
use crate::exchanges::bingx::builder::build_rest_client;
use crate::exchanges::bingx::rest::BingxRestClient;
use crate::exchanges::bingx::streams::{
    AccountDataStream, MarketDataStream, ACCOUNT_STREAM_URL, MARKET_STREAM_URL,
};

/// Entry point bundling the signed REST surface and stream factories
#[derive(Debug, Clone)]
pub struct BingxClient {
    config: ClientConfig,
    rest: BingxRestClient<ReqwestRest>,
    market_stream_url: String,
    account_stream_url: String,
}

impl BingxClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let rest = BingxRestClient::new(build_rest_client(&config)?);
        Ok(Self {
            config,
            rest,
            market_stream_url: MARKET_STREAM_URL.to_string(),
            account_stream_url: ACCOUNT_STREAM_URL.to_string(),
        })
    }

    /// Build from `BINGX_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env("BINGX")?)
    }

    /// Point both stream factories at another endpoint
    #[must_use]
    pub fn with_stream_url(mut self, url: &str) -> Self {
        self.market_stream_url = url.to_string();
        self.account_stream_url = url.to_string();
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Raw signed transport, for endpoints without a typed wrapper
    pub fn rest(&self) -> &ReqwestRest {
        self.rest.inner()
    }

    pub fn market(&self) -> &BingxRestClient<ReqwestRest> {
        &self.rest
    }

    /// A fresh, disconnected market data stream
    pub fn market_stream(&self) -> MarketDataStream {
        MarketDataStream::with_url(&self.market_stream_url)
    }

    /// A fresh, disconnected private stream for `listen_key`
    pub fn account_stream(&self, listen_key: &str) -> AccountDataStream {
        AccountDataStream::with_url(&self.account_stream_url, listen_key)
    }
}
