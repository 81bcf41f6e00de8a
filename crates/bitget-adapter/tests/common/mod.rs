/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bitget-adapter tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bitget_adapter::{OnMessage, WsConfig};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// A text frame received by the server, tagged with the connection it
/// arrived on (1-based, in accept order)
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    pub connection: usize,
    pub text: String,
}

/// Loopback WebSocket server.
///
/// Accepts one connection at a time (matching the single-session client),
/// answers `ping` with `pong`, optionally confirms login envelopes, records
/// every received text frame, and can inject frames or drop the connection.
pub struct MockWsServer {
    pub url: String,
    received: mpsc::UnboundedReceiver<ReceivedFrame>,
    inject_tx: broadcast::Sender<String>,
    drop_tx: broadcast::Sender<()>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    pub async fn start(auto_login: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("local addr"));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (inject_tx, _) = broadcast::channel(64);
        let (drop_tx, _) = broadcast::channel(8);
        let connections = Arc::new(AtomicUsize::new(0));

        let inject: broadcast::Sender<String> = inject_tx.clone();
        let drops = drop_tx.clone();
        let accepted = connections.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                let connection = accepted.fetch_add(1, Ordering::SeqCst) + 1;
                let (mut write, mut read) = ws.split();
                let mut inject_rx = inject.subscribe();
                let mut drop_rx = drops.subscribe();

                loop {
                    tokio::select! {
                        frame = read.next() => {
                            match frame {
                                Some(Ok(Message::Text(text))) => {
                                    let text = text.to_string();
                                    if text == "ping" {
                                        let _ = write
                                            .send(Message::Text("pong".to_string().into()))
                                            .await;
                                    }
                                    if auto_login && text.contains(r#""op":"login""#) {
                                        let reply = r#"{"event":"login","code":0,"msg":""}"#;
                                        let _ = write
                                            .send(Message::Text(reply.to_string().into()))
                                            .await;
                                    }
                                    let _ = received_tx.send(ReceivedFrame { connection, text });
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(_)) => break,
                            }
                        }
                        frame = inject_rx.recv() => {
                            if let Ok(text) = frame {
                                let _ = write.send(Message::Text(text.into())).await;
                            }
                        }
                        dropped = drop_rx.recv() => {
                            if dropped.is_ok() {
                                let _ = write.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self {
            url,
            received,
            inject_tx,
            drop_tx,
            connections,
        }
    }

    /// Push a frame to the currently-connected client
    pub fn inject(&self, text: &str) {
        let _ = self.inject_tx.send(text.to_string());
    }

    /// Close the current connection from the server side
    #[allow(dead_code)]
    pub fn drop_connection(&self) {
        let _ = self.drop_tx.send(());
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Next received frame, keepalive pings skipped
    pub async fn next_frame(&mut self) -> ReceivedFrame {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.received.recv())
                .await
                .expect("timed out waiting for a frame")
                .expect("server receive channel closed");
            if frame.text != "ping" {
                return frame;
            }
        }
    }

    /// Collect non-ping frames for a fixed window
    #[allow(dead_code)]
    pub async fn drain_frames(&mut self, window: Duration) -> Vec<ReceivedFrame> {
        let mut frames = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        loop {
            match tokio::time::timeout_at(deadline, self.received.recv()).await {
                Ok(Some(frame)) => {
                    if frame.text != "ping" {
                        frames.push(frame);
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }
        frames
    }
}

/// Callback that forwards each raw frame into a channel
pub fn channel_handler() -> (OnMessage, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: OnMessage = Arc::new(move |raw: &str| {
        let _ = tx.send(raw.to_string());
    });
    (handler, rx)
}

/// Await one frame from a callback channel with a bounded wait
pub async fn expect_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a dispatched frame")
        .expect("handler channel closed")
}

/// Session tuning fast enough for tests, with staleness recovery disabled
pub fn quiet_config(url: &str) -> WsConfig {
    WsConfig {
        endpoint: url.to_string(),
        heartbeat_interval: Duration::from_millis(100),
        staleness_tick: Duration::from_secs(60),
        reconnect_threshold: Duration::from_secs(120),
        login_timeout: Duration::from_millis(500),
        ..WsConfig::default()
    }
}

/// Session tuning that makes silence trigger a reconnect quickly.
/// Heartbeats are effectively disabled so silence can accrue.
#[allow(dead_code)]
pub fn stale_config(url: &str) -> WsConfig {
    WsConfig {
        endpoint: url.to_string(),
        heartbeat_interval: Duration::from_secs(60),
        staleness_tick: Duration::from_millis(50),
        reconnect_threshold: Duration::from_millis(400),
        login_timeout: Duration::from_millis(500),
        ..WsConfig::default()
    }
}
