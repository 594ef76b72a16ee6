use crate::core::errors::{BingxError, Result};
use flate2::read::GzDecoder;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::io::Read;
use tokio_tungstenite::tungstenite::Message;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflate a gzip frame; plain frames pass through untouched.
///
/// Empty frames and corrupt gzip payloads are reported as `DecodeError`.
pub fn decompress(frame: &[u8]) -> Result<Cow<'_, [u8]>> {
    if frame.is_empty() {
        return Err(BingxError::DecodeError("empty frame".to_string()));
    }

    if !frame.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(frame));
    }

    let mut decoder = GzDecoder::new(frame);
    let mut inflated = Vec::with_capacity(frame.len() * 4);
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| BingxError::DecodeError(format!("gzip: {}", e)))?;

    Ok(Cow::Owned(inflated))
}

/// Decode one data frame into JSON.
///
/// Control frames (ping, pong, close) are handled by the transport and yield `None`.
pub fn decode_frame(message: &Message) -> Result<Option<Value>> {
    let payload: &[u8] = match message {
        Message::Text(text) => text.as_bytes(),
        Message::Binary(data) => data.as_slice(),
        _ => return Ok(None),
    };

    let data = decompress(payload)?;
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| BingxError::DecodeError(format!("Failed to parse JSON: {}", e)))
}

/// Reply for an application-level keep-alive probe, if `message` is one
pub fn keep_alive_reply(message: &Value) -> Option<Value> {
    message.get("ping").map(|token| json!({ "pong": token }))
}
