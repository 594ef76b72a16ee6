use bingx::core::config::ClientConfig;
use bingx::{BingxClient, MarketDataStream};
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // Signed REST calls need BINGX_API_KEY / BINGX_SECRET_KEY
    match ClientConfig::from_env("BINGX") {
        Ok(config) => {
            let client = BingxClient::new(config)?;
            match client.market().get_server_time().await {
                Ok(time) => info!(server_time = time, "Fetched server time"),
                Err(e) => warn!("Error fetching server time: {}", e),
            }
        }
        Err(e) => warn!("Skipping REST demo: {}", e),
    }

    let stream = MarketDataStream::new();
    stream.on_message(|message| {
        if let Some(data_type) = message.get("dataType").and_then(|v| v.as_str()) {
            info!(data_type, "{}", message["data"]);
        }
    });

    stream.connect().await?;
    let id = stream.subscribe_trade("BTC-USDT", None).await?;
    info!(request_id = %id, "Subscribed to BTC-USDT trades");

    let listener = stream.clone();
    let handle = tokio::spawn(async move { listener.listen().await });

    tokio::time::sleep(Duration::from_secs(15)).await;

    stream.unsubscribe_trade("BTC-USDT", Some(&id)).await?;
    stream.disconnect().await?;

    if let Err(e) = handle.await? {
        error!("Stream ended with error: {}", e);
    }

    Ok(())
}
