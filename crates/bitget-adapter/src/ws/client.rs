/*
[INPUT]:  Session configuration and application callbacks
[OUTPUT]: A managed push-channel session with topic subscriptions
[POS]:    WebSocket layer - public client facade
[UPDATE]: When the public operation surface changes
*/

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::WsConfig;
use crate::http::Result;
use crate::ws::connection::{Connection, SessionState};
use crate::ws::message::WsRequest;
use crate::ws::router::MessageRouter;
use crate::ws::subscription::{OnMessage, SubscriptionRegistry, Topic};

/// Push-channel client for the exchange.
///
/// Construction spawns the read, heartbeat, and staleness-watch loops, which
/// idle until [`connect`](Self::connect) opens a transport and run until
/// [`close`](Self::close). Subscriptions survive reconnects: the registry is
/// replayed whenever the session comes back up.
///
/// Must be created inside a Tokio runtime.
pub struct BitgetWsClient {
    connection: Arc<Connection>,
    router: Arc<MessageRouter>,
    registry: Arc<SubscriptionRegistry>,
    state_rx: watch::Receiver<SessionState>,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl BitgetWsClient {
    /// Create a client with a default listener for unmatched data frames and
    /// an error listener for server error frames.
    pub fn new(config: WsConfig, listener: OnMessage, error_listener: OnMessage) -> Self {
        let registry = Arc::new(SubscriptionRegistry::default());
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let state_tx = Arc::new(state_tx);

        let router = Arc::new(MessageRouter::new(
            registry.clone(),
            listener,
            error_listener,
            state_tx.clone(),
        ));
        let connection = Arc::new(Connection::new(config, registry.clone(), state_tx));

        let tasks = vec![
            tokio::spawn(connection.clone().run_read_loop(router.clone())),
            tokio::spawn(connection.clone().run_heartbeat()),
            tokio::spawn(connection.clone().run_staleness_watch()),
        ];

        Self {
            connection,
            router,
            registry,
            state_rx,
            tasks: std::sync::Mutex::new(tasks),
        }
    }

    /// Open the session and, when the configuration demands it, block until
    /// login is confirmed. Dial failures are surfaced without retry; once a
    /// session was up, staleness recovery takes over.
    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    /// Current session state
    pub fn session_state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Active topics, normalized
    pub fn subscriptions(&self) -> Vec<Topic> {
        self.registry.snapshot_active()
    }

    /// Subscribe topics to a dedicated callback.
    ///
    /// The registry is updated before the wire request goes out, so a dropped
    /// send is recovered by the next reconnect replay.
    pub async fn subscribe(&self, topics: &[Topic], handler: OnMessage) -> Result<()> {
        let normalized = self.registry.insert(topics, Some(handler));
        info!(count = normalized.len(), "ws subscribing");
        self.send_envelope(&WsRequest::subscribe(&normalized)).await
    }

    /// Subscribe topics to the process-default listener
    pub async fn subscribe_without_callback(&self, topics: &[Topic]) -> Result<()> {
        let normalized = self.registry.insert(topics, None);
        info!(count = normalized.len(), "ws subscribing");
        self.send_envelope(&WsRequest::subscribe(&normalized)).await
    }

    /// Unsubscribe topics. Unknown topics are ignored.
    pub async fn unsubscribe(&self, topics: &[Topic]) -> Result<()> {
        let normalized = self.registry.remove(topics);
        if normalized.is_empty() {
            return Ok(());
        }
        info!(count = normalized.len(), "ws unsubscribing");
        self.send_envelope(&WsRequest::unsubscribe(&normalized)).await
    }

    /// Send a raw text frame
    pub async fn send_raw(&self, text: &str) -> Result<()> {
        self.connection.send_text(text).await
    }

    /// Serialize and send an outbound envelope
    pub async fn send_envelope(&self, request: &WsRequest) -> Result<()> {
        self.connection.send_text(&request.to_text()?).await
    }

    /// Replace the fallback handler for frames no other rule claims
    pub fn set_fallback_handler(&self, handler: OnMessage) {
        self.router.set_fallback(handler);
    }

    /// Stop the background loops and close the transport
    pub async fn close(&self) {
        self.connection.close().await;
        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self
                .tasks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl std::fmt::Debug for BitgetWsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitgetWsClient")
            .field("state", &self.session_state())
            .field("subscriptions", &self.registry.len())
            .finish()
    }
}
