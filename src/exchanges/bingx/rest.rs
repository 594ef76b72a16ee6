use crate::core::errors::{BingxError, Result};
use crate::core::kernel::RestClient;
use crate::core::types::{ApiResponse, ParameterSet};
use crate::exchanges::bingx::types::{OrderRequest, ServerTime};
use serde_json::Value;
use tracing::instrument;

const SERVER_TIME: &str = "/openApi/swap/v2/market/time";
const SYMBOLS: &str = "/openApi/swap/v2/market/symbols";
const LATEST_PRICE: &str = "/openApi/swap/v2/market/latestPrice";
const DEPTH: &str = "/openApi/swap/v2/market/depth";
const TRADES: &str = "/openApi/swap/v2/market/trades";
const KLINES: &str = "/openApi/swap/v2/market/kline";
const TICKER_24HR: &str = "/openApi/swap/v2/market/ticker24hr";
const BALANCE: &str = "/openApi/swap/v2/user/balance";
const POSITIONS: &str = "/openApi/swap/v2/user/positions";
const ORDER: &str = "/openApi/swap/v2/trade/order";
const USER_DATA_STREAM: &str = "/openApi/user/auth/userDataStream";

/// Thin typed wrapper around `RestClient` for the perpetual swap API
///
/// Methods return the decoded envelope unless noted; venue errors have
/// already been classified by the transport.
#[derive(Debug, Clone)]
pub struct BingxRestClient<R: RestClient> {
    client: R,
}

impl<R: RestClient> BingxRestClient<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    /// The underlying signed transport
    pub fn inner(&self) -> &R {
        &self.client
    }

    /// Server clock in milliseconds
    pub async fn get_server_time(&self) -> Result<i64> {
        let response: ApiResponse = self
            .client
            .request_json(reqwest::Method::GET, SERVER_TIME, ParameterSet::new())
            .await?;
        let data = response.data.ok_or_else(|| BingxError::MalformedResponse {
            message: "server time response has no data".to_string(),
            raw: String::new(),
        })?;
        let time: ServerTime = serde_json::from_value(data).map_err(|e| {
            BingxError::SerializationError(format!("Failed to parse server time: {}", e))
        })?;
        Ok(time.server_time)
    }

    pub async fn get_symbols(&self) -> Result<Value> {
        self.client.get(SYMBOLS, ParameterSet::new()).await
    }

    #[instrument(skip(self))]
    pub async fn get_latest_price(&self, symbol: &str) -> Result<Value> {
        self.client
            .get(LATEST_PRICE, ParameterSet::new().with("symbol", symbol))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_depth(&self, symbol: &str, limit: u32) -> Result<Value> {
        let params = ParameterSet::new()
            .with("symbol", symbol)
            .with("limit", limit);
        self.client.get(DEPTH, params).await
    }

    #[instrument(skip(self))]
    pub async fn get_recent_trades(&self, symbol: &str, limit: u32) -> Result<Value> {
        let params = ParameterSet::new()
            .with("symbol", symbol)
            .with("limit", limit);
        self.client.get(TRADES, params).await
    }

    /// Candlesticks; `interval` uses the venue's notation (`1m`, `1h`, `1d`, ...)
    #[instrument(skip(self))]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Value> {
        let mut params = ParameterSet::new()
            .with("symbol", symbol)
            .with("interval", interval)
            .with("limit", limit);
        params.insert_opt("startTime", start_time);
        params.insert_opt("endTime", end_time);

        self.client.get(KLINES, params).await
    }

    /// 24h statistics for one symbol, or for all when `symbol` is `None`
    pub async fn get_24hr_ticker(&self, symbol: Option<&str>) -> Result<Value> {
        let mut params = ParameterSet::new();
        params.insert_opt("symbol", symbol);
        self.client.get(TICKER_24HR, params).await
    }

    pub async fn get_balance(&self) -> Result<Value> {
        self.client.get(BALANCE, ParameterSet::new()).await
    }

    pub async fn get_positions(&self, symbol: Option<&str>) -> Result<Value> {
        let mut params = ParameterSet::new();
        params.insert_opt("symbol", symbol);
        self.client.get(POSITIONS, params).await
    }

    #[instrument(skip(self, order), fields(symbol = %order.symbol, side = %order.side))]
    pub async fn create_order(&self, order: &OrderRequest) -> Result<Value> {
        self.client.post(ORDER, order.to_params()).await
    }

    /// Place an order from raw parameters
    pub async fn create_order_with_params(&self, params: ParameterSet) -> Result<Value> {
        self.client.post(ORDER, params).await
    }

    /// Cancel by venue order id or by client order id
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
    ) -> Result<Value> {
        let mut params = ParameterSet::new().with("symbol", symbol);
        params.insert_opt("orderId", order_id);
        params.insert_opt("clientOrderId", client_order_id);

        self.client.delete(ORDER, params).await
    }

    /// Create a listen key for the private stream
    pub async fn generate_listen_key(&self) -> Result<String> {
        let response = self
            .client
            .post(USER_DATA_STREAM, ParameterSet::new())
            .await?;

        response
            .get("listenKey")
            .or_else(|| response.pointer("/data/listenKey"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BingxError::MalformedResponse {
                message: "listen key missing from response".to_string(),
                raw: response.to_string(),
            })
    }

    /// Keep a listen key alive
    pub async fn extend_listen_key(&self, listen_key: &str) -> Result<Value> {
        self.client
            .put(
                USER_DATA_STREAM,
                ParameterSet::new().with("listenKey", listen_key),
            )
            .await
    }

    pub async fn delete_listen_key(&self, listen_key: &str) -> Result<Value> {
        self.client
            .delete(
                USER_DATA_STREAM,
                ParameterSet::new().with("listenKey", listen_key),
            )
            .await
    }
}
