/*
[INPUT]:  Push-channel endpoint and optional credentials
[OUTPUT]: Real-time ticker updates printed to stdout
[POS]:    Examples - push-channel stream handling
[UPDATE]: When the WebSocket API changes
*/

use std::sync::Arc;

use bitget_adapter::{BitgetWsClient, OnMessage, Topic, WsConfig};
use tokio::time::{Duration, sleep};

/// Example: subscribe to a public ticker stream
///
/// The client keeps the session alive on its own: heartbeats every 15s and
/// an automatic reconnect (with subscription replay) when the connection
/// goes silent.
#[tokio::main]
async fn main() {
    let listener: OnMessage = Arc::new(|raw| {
        println!("data: {raw}");
    });
    let error_listener: OnMessage = Arc::new(|raw| {
        eprintln!("server error: {raw}");
    });

    let client = BitgetWsClient::new(WsConfig::default(), listener, error_listener);

    if let Err(err) = client.connect().await {
        eprintln!("connect failed: {err}");
        return;
    }
    println!("✓ Connected");

    let ticker: OnMessage = Arc::new(|raw| {
        println!("ticker: {raw}");
    });
    if let Err(err) = client
        .subscribe(&[Topic::new("mc", "ticker", "BTCUSDT")], ticker)
        .await
    {
        eprintln!("subscribe failed: {err}");
    }
    println!("✓ Subscribed, streaming for 30 seconds...");

    sleep(Duration::from_secs(30)).await;

    client.close().await;
    println!("✓ Done");
}
