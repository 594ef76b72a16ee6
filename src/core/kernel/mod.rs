//! Transport kernel shared by every venue endpoint
//!
//! The kernel holds transport logic only: signing, the signed request
//! pipeline, frame decoding, stream lifecycle and observer fan-out. Endpoint
//! paths and payload shapes live under `exchanges`.
//!
//! # Components
//!
//! ## Transport
//! - `RestClient` / `ReqwestRest`: signed HTTP request pipeline
//! - `StreamConnection`: one persistent WebSocket with a cancellable receive loop
//!
//! ## Authentication
//! - `Signer`: pluggable payload signing
//! - `HmacSigner`: HMAC-SHA256 with hex or base64 output
//!
//! ## Message handling
//! - `codec`: gzip inflation, JSON decoding and keep-alive replies
//! - `Dispatcher`: ordered observer fan-out
//! - `subscription`: subscribe / unsubscribe envelopes and channel names
//!
//! # Usage
//!
//! ## Signed REST call
//! ```rust,no_run
//! use bingx::core::kernel::*;
//! use bingx::core::types::ParameterSet;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rest_config = RestClientConfig::new(
//!     "https://open-api.bingx.com".to_string(),
//!     "bingx".to_string(),
//! );
//! let signer = Arc::new(HmacSigner::new(
//!     "api_key".to_string(),
//!     "secret_key".to_string(),
//!     SignatureEncoding::Hex,
//! ));
//! let rest = RestClientBuilder::new(rest_config)
//!     .with_signer(signer)
//!     .build()?;
//!
//! let params = ParameterSet::new().with("symbol", "BTC-USDT");
//! let price = rest.get("/openApi/swap/v2/quote/price", params).await?;
//! println!("{}", price);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//! ```rust,no_run
//! use bingx::core::kernel::*;
//! use std::sync::Arc;
//!
//! # async fn stream_example() -> Result<(), Box<dyn std::error::Error>> {
//! let ws = Arc::new(StreamConnection::new(
//!     "wss://open-api-swap.bingx.com/swap-market".to_string(),
//!     "bingx".to_string(),
//! ));
//! ws.on_message(|message| println!("{}", message));
//! ws.connect().await?;
//! ws.subscribe(Channel::trade("BTC-USDT")).await?;
//!
//! let listener = Arc::clone(&ws);
//! let handle = tokio::spawn(async move { listener.listen().await });
//!
//! ws.disconnect().await?;
//! handle.await??;
//! # Ok(())
//! # }
//! ```
pub mod codec;
pub mod dispatcher;
pub mod rest;
pub mod signer;
pub mod subscription;
pub mod ws;

// Re-export key types for convenience
pub use dispatcher::{Dispatcher, Observer};
pub use rest::{
    Clock, FixedClock, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig, SystemClock,
};
pub use signer::{HmacSigner, SignatureEncoding, Signer};
pub use subscription::{generate_request_id, Channel, RequestType, SubscriptionRequest};
pub use ws::{StreamConnection, WsConfig};
