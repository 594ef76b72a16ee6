use crate::core::types::ParameterSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `data` payload of the server time endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    TakeProfitMarket,
    Stop,
    TakeProfit,
    TrailingStopMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    Gtc,
    #[serde(rename = "IOC")]
    Ioc,
    #[serde(rename = "FOK")]
    Fok,
    #[serde(rename = "PostOnly")]
    PostOnly,
}

macro_rules! wire_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
                f.write_str(value.as_str().unwrap_or_default())
            }
        })*
    };
}

wire_display!(OrderSide, PositionSide, OrderType, TimeInForce);

/// Perpetual swap order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    pub position_side: Option<PositionSide>,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: Option<String>,
    pub reduce_only: Option<bool>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            position_side: None,
            price: None,
            stop_price: None,
            time_in_force: None,
            client_order_id: None,
            reduce_only: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: f64, price: f64) -> Self {
        Self {
            order_type: OrderType::Limit,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
            ..Self::market(symbol, side, quantity)
        }
    }

    #[must_use]
    pub fn position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }

    #[must_use]
    pub fn client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }

    #[must_use]
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }

    /// Wire parameters for the order endpoint
    pub fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new()
            .with("symbol", self.symbol.as_str())
            .with("side", self.side.to_string())
            .with("type", self.order_type.to_string())
            .with("quantity", self.quantity);

        params.insert_opt("positionSide", self.position_side.map(|s| s.to_string()));
        params.insert_opt("price", self.price);
        params.insert_opt("stopPrice", self.stop_price);
        params.insert_opt("timeInForce", self.time_in_force.map(|t| t.to_string()));
        params.insert_opt("clientOrderId", self.client_order_id.as_deref());
        params.insert_opt("reduceOnly", self.reduce_only);
        params
    }
}

/// Category of a private stream event, derived from its `e` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountEventKind {
    Account,
    Order,
    Unknown,
}

impl AccountEventKind {
    pub const ACCOUNT_UPDATE: &'static str = "ACCOUNT_UPDATE";
    pub const ORDER_TRADE_UPDATE: &'static str = "ORDER_TRADE_UPDATE";

    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            Self::ACCOUNT_UPDATE => Self::Account,
            Self::ORDER_TRADE_UPDATE => Self::Order,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Order => "order",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccountEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_params() {
        let order = OrderRequest::limit("BTC-USDT", OrderSide::Buy, 0.001, 30000.5)
            .position_side(PositionSide::Long)
            .client_order_id("my-order-1");

        assert_eq!(
            order.to_params().to_query_string(),
            "clientOrderId=my-order-1&positionSide=LONG&price=30000.5&quantity=0.001\
             &side=BUY&symbol=BTC-USDT&timeInForce=GTC&type=LIMIT"
        );
    }

    #[test]
    fn test_market_order_omits_unset_fields() {
        let params = OrderRequest::market("ETH-USDT", OrderSide::Sell, 2.0)
            .reduce_only(true)
            .to_params();

        assert!(params.get("price").is_none());
        assert!(params.get("timeInForce").is_none());
        assert_eq!(
            params.to_query_string(),
            "quantity=2&reduceOnly=true&side=SELL&symbol=ETH-USDT&type=MARKET"
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(OrderType::TakeProfitMarket.to_string(), "TAKE_PROFIT_MARKET");
        assert_eq!(TimeInForce::PostOnly.to_string(), "PostOnly");
        assert_eq!(PositionSide::Both.to_string(), "BOTH");
    }

    #[test]
    fn test_account_event_kind() {
        assert_eq!(
            AccountEventKind::from_event_type("ACCOUNT_UPDATE"),
            AccountEventKind::Account
        );
        assert_eq!(
            AccountEventKind::from_event_type("ORDER_TRADE_UPDATE").as_str(),
            "order"
        );
        assert_eq!(
            AccountEventKind::from_event_type("listenKeyExpired").to_string(),
            "unknown"
        );
    }
}
