pub mod core;
pub mod exchanges;

pub use crate::core::{
    config::ClientConfig,
    errors::{BingxError, Result},
    kernel::{Channel, StreamConnection},
    types::*,
};
pub use exchanges::bingx::{AccountDataStream, BingxClient, BingxRestClient, MarketDataStream};
