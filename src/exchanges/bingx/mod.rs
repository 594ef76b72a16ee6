pub mod builder;
pub mod client;
pub mod rest;
pub mod streams;
pub mod types;

/// Name used in logs and spans
pub const EXCHANGE_NAME: &str = "bingx";

// Re-export main types for easier importing
pub use builder::{build_rest_client, build_rest_client_with_clock};
pub use client::BingxClient;
pub use rest::BingxRestClient;
pub use streams::{AccountDataStream, MarketDataStream, ACCOUNT_STREAM_URL, MARKET_STREAM_URL};
pub use types::{
    AccountEventKind, OrderRequest, OrderSide, OrderType, PositionSide, ServerTime, TimeInForce,
};
