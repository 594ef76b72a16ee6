use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Sub,
    Unsub,
}

/// Envelope for subscribe / unsubscribe requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub id: String,
    pub req_type: RequestType,
    pub data_type: String,
}

impl SubscriptionRequest {
    pub fn subscribe(id: impl Into<String>, channel: impl fmt::Display) -> Self {
        Self {
            id: id.into(),
            req_type: RequestType::Sub,
            data_type: channel.to_string(),
        }
    }

    pub fn unsubscribe(id: impl Into<String>, channel: impl fmt::Display) -> Self {
        Self {
            id: id.into(),
            req_type: RequestType::Unsub,
            data_type: channel.to_string(),
        }
    }
}

/// Stream name in the form `<symbol>@<stream>[_<param>]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    symbol: String,
    stream: String,
}

impl Channel {
    /// Arbitrary stream on a symbol, e.g. `Channel::custom("BTC-USDT", "lastPrice")`
    pub fn custom(symbol: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            stream: stream.into(),
        }
    }

    pub fn trade(symbol: impl Into<String>) -> Self {
        Self::custom(symbol, "trade")
    }

    /// `BTC-USDT@kline_1m`
    pub fn kline(symbol: impl Into<String>, interval: &str) -> Self {
        Self::custom(symbol, format!("kline_{}", interval))
    }

    /// `BTC-USDT@depth20`
    pub fn depth(symbol: impl Into<String>, levels: u32) -> Self {
        Self::custom(symbol, format!("depth{}", levels))
    }

    pub fn ticker(symbol: impl Into<String>) -> Self {
        Self::custom(symbol, "ticker")
    }

    pub fn book_ticker(symbol: impl Into<String>) -> Self {
        Self::custom(symbol, "bookTicker")
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.stream)
    }
}

/// Fresh request id: wall-clock nanoseconds plus a process-wide sequence number
pub fn generate_request_id() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let sequence = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("bingx_{}_{}", nanos, sequence)
}
