//! Shared fixtures for the integration tests

use bingx::core::config::ClientConfig;
use bingx::core::kernel::{FixedClock, HmacSigner, ReqwestRest, SignatureEncoding, Signer};
use bingx::exchanges::bingx::build_rest_client_with_clock;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, WebSocketStream};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const SECRET_KEY: &str = "test-secret-key";
pub const FIXED_TIMESTAMP: u64 = 1_700_000_000_000;

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY.to_string(), SECRET_KEY.to_string())
        .base_url(server.uri())
        .signature_encoding(SignatureEncoding::Hex)
}

/// REST transport against `config` with the clock frozen at `FIXED_TIMESTAMP`
#[allow(dead_code)]
pub fn rest_client(config: &ClientConfig) -> ReqwestRest {
    build_rest_client_with_clock(config, Arc::new(FixedClock(FIXED_TIMESTAMP)))
        .expect("rest client should build")
}

/// Signature the venue would expect for `payload`
#[allow(dead_code)]
pub fn expected_signature(payload: &str, encoding: SignatureEncoding) -> String {
    HmacSigner::new(API_KEY.to_string(), SECRET_KEY.to_string(), encoding)
        .sign(payload)
        .expect("signing should succeed")
}

#[allow(dead_code)]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Accept one WebSocket client on a loopback port and hand it to `handler`.
///
/// Returns the `ws://` URL to connect to.
#[allow(dead_code)]
pub async fn spawn_ws_server<F, Fut>(handler: F) -> String
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = accept_async(socket).await.unwrap();
        handler(ws).await;
    });

    format!("ws://{}", addr)
}

/// A loopback URL nothing is listening on
#[allow(dead_code)]
pub async fn unused_ws_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}
