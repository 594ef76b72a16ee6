use crate::core::errors::Result;
use crate::core::kernel::{generate_request_id, Channel, StreamConnection, WsConfig};
use crate::exchanges::bingx::types::AccountEventKind;
use crate::exchanges::bingx::EXCHANGE_NAME;
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

/// Public market data endpoint for perpetual swaps
pub const MARKET_STREAM_URL: &str = "wss://open-api-swap.bingx.com/swap-market";

/// Private stream endpoint; the listen key is appended as a query parameter
pub const ACCOUNT_STREAM_URL: &str = "wss://open-api-swap.bingx.com/swap-market";

fn request_id(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_request_id(),
    }
}

/// Market data stream with per-channel subscribe helpers.
///
/// Clones share one connection; hand a clone to the task running `listen`.
/// Every `subscribe_*` / `unsubscribe_*` returns the request id that was sent.
#[derive(Debug, Clone)]
pub struct MarketDataStream {
    connection: Arc<StreamConnection>,
}

impl MarketDataStream {
    pub fn new() -> Self {
        Self::with_url(MARKET_STREAM_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self::from_connection(StreamConnection::new(
            url.to_string(),
            EXCHANGE_NAME.to_string(),
        ))
    }

    pub fn with_url_and_config(url: &str, config: WsConfig) -> Self {
        Self::from_connection(
            StreamConnection::new(url.to_string(), EXCHANGE_NAME.to_string()).with_config(config),
        )
    }

    pub fn from_connection(connection: StreamConnection) -> Self {
        Self {
            connection: Arc::new(connection),
        }
    }

    pub fn connection(&self) -> Arc<StreamConnection> {
        Arc::clone(&self.connection)
    }

    async fn send_subscribe(&self, channel: Channel, id: Option<&str>) -> Result<String> {
        let id = request_id(id);
        self.connection.subscribe_with_id(&id, channel).await?;
        Ok(id)
    }

    async fn send_unsubscribe(&self, channel: Channel, id: Option<&str>) -> Result<String> {
        let id = request_id(id);
        self.connection.unsubscribe_with_id(&id, channel).await?;
        Ok(id)
    }

    pub async fn subscribe_trade(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_subscribe(Channel::trade(symbol), id).await
    }

    pub async fn subscribe_kline(
        &self,
        symbol: &str,
        interval: &str,
        id: Option<&str>,
    ) -> Result<String> {
        self.send_subscribe(Channel::kline(symbol, interval), id)
            .await
    }

    pub async fn subscribe_depth(&self, symbol: &str, levels: u32, id: Option<&str>) -> Result<String> {
        self.send_subscribe(Channel::depth(symbol, levels), id).await
    }

    pub async fn subscribe_ticker(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_subscribe(Channel::ticker(symbol), id).await
    }

    pub async fn subscribe_book_ticker(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_subscribe(Channel::book_ticker(symbol), id).await
    }

    pub async fn unsubscribe_trade(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_unsubscribe(Channel::trade(symbol), id).await
    }

    pub async fn unsubscribe_kline(
        &self,
        symbol: &str,
        interval: &str,
        id: Option<&str>,
    ) -> Result<String> {
        self.send_unsubscribe(Channel::kline(symbol, interval), id)
            .await
    }

    pub async fn unsubscribe_depth(
        &self,
        symbol: &str,
        levels: u32,
        id: Option<&str>,
    ) -> Result<String> {
        self.send_unsubscribe(Channel::depth(symbol, levels), id)
            .await
    }

    pub async fn unsubscribe_ticker(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_unsubscribe(Channel::ticker(symbol), id).await
    }

    pub async fn unsubscribe_book_ticker(&self, symbol: &str, id: Option<&str>) -> Result<String> {
        self.send_unsubscribe(Channel::book_ticker(symbol), id)
            .await
    }
}

impl Default for MarketDataStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MarketDataStream {
    type Target = StreamConnection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

/// Private account stream, authenticated by a listen key
#[derive(Debug, Clone)]
pub struct AccountDataStream {
    connection: Arc<StreamConnection>,
}

impl AccountDataStream {
    pub fn new(listen_key: &str) -> Self {
        Self::with_url(ACCOUNT_STREAM_URL, listen_key)
    }

    pub fn with_url(url: &str, listen_key: &str) -> Self {
        let connection = StreamConnection::new(url.to_string(), EXCHANGE_NAME.to_string())
            .with_query("listenKey", listen_key);
        Self {
            connection: Arc::new(connection),
        }
    }

    pub fn connection(&self) -> Arc<StreamConnection> {
        Arc::clone(&self.connection)
    }

    /// Observe every event that carries a string `e` field, tagged by kind
    pub fn on_account_update<F>(&self, callback: F) -> usize
    where
        F: Fn(AccountEventKind, &Value) + Send + Sync + 'static,
    {
        self.connection.on_message(move |message| {
            if let Some(kind) = event_type(message).map(AccountEventKind::from_event_type) {
                callback(kind, message);
            }
        })
    }

    /// Observe the balance list (`a.B`) of account updates
    pub fn on_balance_update<F>(&self, callback: F) -> usize
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.connection.on_message(move |message| {
            if let Some(balances) = account_field(message, "B") {
                callback(balances);
            }
        })
    }

    /// Observe the position list (`a.P`) of account updates
    pub fn on_position_update<F>(&self, callback: F) -> usize
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.connection.on_message(move |message| {
            if let Some(positions) = account_field(message, "P") {
                callback(positions);
            }
        })
    }

    /// Observe the order payload (`o`) of order trade updates
    pub fn on_order_update<F>(&self, callback: F) -> usize
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.connection.on_message(move |message| {
            if event_type(message) == Some(AccountEventKind::ORDER_TRADE_UPDATE) {
                if let Some(order) = message.get("o") {
                    callback(order);
                }
            }
        })
    }
}

impl Deref for AccountDataStream {
    type Target = StreamConnection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

fn event_type(message: &Value) -> Option<&str> {
    message.get("e").and_then(Value::as_str)
}

fn account_field<'a>(message: &'a Value, field: &str) -> Option<&'a Value> {
    if event_type(message) != Some(AccountEventKind::ACCOUNT_UPDATE) {
        return None;
    }
    message.get("a").filter(|a| a.is_object())?.get(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn account_update() -> Value {
        json!({
            "e": "ACCOUNT_UPDATE",
            "E": 1_700_000_000_000_i64,
            "a": {
                "m": "ORDER",
                "B": [{"a": "USDT", "wb": "100.5", "cw": "100.5", "bc": "0"}],
                "P": [{"s": "BTC-USDT", "pa": "0.001", "ep": "30000", "ps": "LONG"}]
            }
        })
    }

    fn order_update() -> Value {
        json!({
            "e": "ORDER_TRADE_UPDATE",
            "o": {"s": "BTC-USDT", "c": "my-order-1", "S": "BUY", "X": "FILLED"}
        })
    }

    #[test]
    fn test_account_stream_url_carries_listen_key() {
        let stream = AccountDataStream::new("lk-123");
        assert_eq!(
            stream.url(),
            "wss://open-api-swap.bingx.com/swap-market?listenKey=lk-123"
        );
    }

    #[test]
    fn test_account_update_kinds() {
        let stream = AccountDataStream::new("lk");
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let k = Arc::clone(&kinds);
        stream.on_account_update(move |kind, _| k.lock().unwrap().push(kind));

        stream.dispatcher().dispatch(&account_update());
        stream.dispatcher().dispatch(&order_update());
        stream.dispatcher().dispatch(&json!({"e": "listenKeyExpired"}));
        stream.dispatcher().dispatch(&json!({"e": 42}));
        stream.dispatcher().dispatch(&json!({"dataType": "BTC-USDT@trade"}));

        assert_eq!(
            *kinds.lock().unwrap(),
            vec![
                AccountEventKind::Account,
                AccountEventKind::Order,
                AccountEventKind::Unknown
            ]
        );
    }

    #[test]
    fn test_balance_position_and_order_observers() {
        let stream = AccountDataStream::new("lk");
        let balances = Arc::new(Mutex::new(Vec::new()));
        let positions = Arc::new(Mutex::new(Vec::new()));
        let orders = Arc::new(Mutex::new(Vec::new()));

        let b = Arc::clone(&balances);
        stream.on_balance_update(move |v| b.lock().unwrap().push(v.clone()));
        let p = Arc::clone(&positions);
        stream.on_position_update(move |v| p.lock().unwrap().push(v.clone()));
        let o = Arc::clone(&orders);
        stream.on_order_update(move |v| o.lock().unwrap().push(v.clone()));

        stream.dispatcher().dispatch(&account_update());
        stream.dispatcher().dispatch(&order_update());
        // account update without the `a` object is ignored
        stream.dispatcher().dispatch(&json!({"e": "ACCOUNT_UPDATE", "a": "x"}));

        let balances = balances.lock().unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0][0]["a"], "USDT");

        let positions = positions.lock().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0][0]["s"], "BTC-USDT");

        let orders = orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["X"], "FILLED");
    }

    #[test]
    fn test_request_id_prefers_caller_value() {
        assert_eq!(request_id(Some("mine")), "mine");
        assert!(request_id(Some("")).starts_with("bingx_"));
        assert!(request_id(None).starts_with("bingx_"));
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let stream = MarketDataStream::with_url("ws://127.0.0.1:1");
        assert!(stream.subscribe_trade("BTC-USDT", None).await.is_err());
    }
}
