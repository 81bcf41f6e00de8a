/*
[INPUT]:  Session configuration and the subscription registry
[OUTPUT]: A live transport kept healthy across network interruption
[POS]:    WebSocket layer - connection lifecycle, heartbeat, staleness, send path
[UPDATE]: When changing reconnect, keepalive, or login behavior
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::auth::Signer;
use crate::config::WsConfig;
use crate::http::{BitgetError, Result};
use crate::ws::message::{LOGIN_SIGN_METHOD, LOGIN_SIGN_PATH, LoginArg, TEXT_PING, WsRequest};
use crate::ws::router::MessageRouter;
use crate::ws::subscription::SubscriptionRegistry;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Session lifecycle state.
///
/// `Connected` means the socket is open but not (yet) logged in;
/// `Authenticated` means the server confirmed the login envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
}

/// Owns the transport and drives the session lifecycle.
///
/// The write half lives behind an async mutex (the transport is not safe for
/// concurrent writers); the read half is handed to the read loop through a
/// slot, with a transport epoch telling the loop when its reader went stale.
pub(crate) struct Connection {
    config: WsConfig,
    registry: Arc<SubscriptionRegistry>,
    state: Arc<watch::Sender<SessionState>>,
    writer: Mutex<Option<WsWriter>>,
    reader_slot: std::sync::Mutex<Option<WsReader>>,
    /// Bumped on every transport install or teardown
    epoch: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
    last_activity_ms: AtomicI64,
    ever_connected: AtomicBool,
    /// Serializes connect/reconnect cycles
    reconnect_gate: Mutex<()>,
}

impl Connection {
    pub(crate) fn new(
        config: WsConfig,
        registry: Arc<SubscriptionRegistry>,
        state: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        let (epoch, _) = watch::channel(0);
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            registry,
            state,
            writer: Mutex::new(None),
            reader_slot: std::sync::Mutex::new(None),
            epoch,
            shutdown,
            last_activity_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            ever_connected: AtomicBool::new(false),
            reconnect_gate: Mutex::new(()),
        }
    }

    pub(crate) fn session_state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Open the transport and run the session bring-up (login, replay).
    ///
    /// A failed initial connect is surfaced to the caller and not retried
    /// automatically; automatic retries only cover established sessions that
    /// went stale.
    pub(crate) async fn connect(&self) -> Result<()> {
        let _gate = self.reconnect_gate.lock().await;

        if self.session_state() != SessionState::Disconnected {
            return Err(BitgetError::Connection("already connected".to_string()));
        }

        self.state.send_replace(SessionState::Connecting);
        match self.establish().await {
            Ok(()) => {
                // Arm staleness recovery only once a session was fully up
                self.ever_connected.store(true, Ordering::Release);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "ws connect failed");
                self.teardown().await;
                Err(err)
            }
        }
    }

    /// Tear down the stale transport and bring the session back up.
    ///
    /// Dial or login failures are logged and retried on the next staleness
    /// tick rather than surfaced.
    pub(crate) async fn reconnect(&self) {
        let _gate = self.reconnect_gate.lock().await;
        if *self.shutdown.borrow() {
            return;
        }

        warn!("ws connection stale, reconnecting");
        self.teardown().await;
        self.state.send_replace(SessionState::Connecting);
        if let Err(err) = self.establish().await {
            error!(error = %err, "ws reconnect failed");
            // A half-established session must not linger: drop it so the
            // silence keeps accruing and the next watcher tick retries
            self.teardown().await;
        }
    }

    /// Dial, then authenticate when required, then replay subscriptions
    async fn establish(&self) -> Result<()> {
        self.dial_and_install().await?;
        if self.config.need_login {
            self.authenticate().await?;
        }
        self.replay_subscriptions().await;
        Ok(())
    }

    async fn dial_and_install(&self) -> Result<()> {
        info!(url = %self.config.endpoint, "ws connecting");
        let (stream, _response) = connect_async(&self.config.endpoint)
            .await
            .map_err(|e| BitgetError::Connection(e.to_string()))?;

        let (write, read) = stream.split();
        *self.writer.lock().await = Some(write);
        self.install_reader(read);
        self.touch_activity();
        self.state.send_replace(SessionState::Connected);
        // Bump last so the read loop finds the reader already in place
        self.epoch.send_modify(|e| *e += 1);
        info!("ws connected");
        Ok(())
    }

    /// Close the current transport. No-op when nothing is open.
    async fn teardown(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            // Best-effort close frame; a hung transport must not stall us
            let _ = tokio::time::timeout(
                Duration::from_secs(1),
                writer.send(Message::Close(None)),
            )
            .await;
        }
        self.take_reader();
        self.epoch.send_modify(|e| *e += 1);
        self.state.send_replace(SessionState::Disconnected);
    }

    /// Sign and send the login envelope, then wait for confirmation.
    ///
    /// The wait is bounded by `login_timeout`; the read loop flips the
    /// session state when the confirmation event arrives, which wakes this
    /// call. A signing failure only aborts this attempt.
    pub(crate) async fn authenticate(&self) -> Result<()> {
        let credentials = self.config.credentials.as_ref().ok_or_else(|| {
            BitgetError::Config("login requires credentials".to_string())
        })?;
        let signer = Signer::new(credentials.scheme, &credentials.secret_key)?;

        let timestamp = Utc::now().timestamp_millis();
        let sign = signer.sign(LOGIN_SIGN_METHOD, LOGIN_SIGN_PATH, "", timestamp);
        let request = WsRequest::login(LoginArg {
            api_key: credentials.api_key.clone(),
            passphrase: credentials.passphrase.clone(),
            timestamp: timestamp.to_string(),
            sign,
        });

        // Subscribe before sending so the confirmation cannot be missed
        let mut state_rx = self.state.subscribe();
        info!("ws login sent");
        self.send_text(&request.to_text()?).await?;

        let wait = self.config.login_timeout;
        let confirmed = tokio::time::timeout(
            wait,
            state_rx.wait_for(|state| *state == SessionState::Authenticated),
        )
        .await;

        match confirmed {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(BitgetError::Connection(
                "client closed during login".to_string(),
            )),
            Err(_) => Err(BitgetError::LoginTimeout {
                waited_ms: wait.as_millis() as u64,
            }),
        }
    }

    /// Re-subscribe every active topic after the transport came back up
    async fn replay_subscriptions(&self) {
        let topics = self.registry.snapshot_active();
        if topics.is_empty() {
            return;
        }
        info!(count = topics.len(), "ws replaying subscriptions");
        let request = WsRequest::subscribe(&topics);
        let text = match request.to_text() {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "ws subscription replay failed");
                return;
            }
        };
        if let Err(err) = self.send_text(&text).await {
            error!(error = %err, "ws subscription replay failed");
        }
    }

    /// Write one text frame under the send lock.
    ///
    /// Fails fast when no transport is open (also the case while a reconnect
    /// is mid-flight); the message is dropped, not queued.
    pub(crate) async fn send_text(&self, text: &str) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            error!("ws send failed: no active connection");
            return Err(BitgetError::Send("no active connection".to_string()));
        };

        debug!(message = text, "ws send");
        writer
            .send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| {
                error!(error = %e, "ws send failed");
                BitgetError::Send(e.to_string())
            })
    }

    /// Stop the background loops and close the transport.
    ///
    /// Taking the gate waits out any in-flight reconnect cycle, so a
    /// transport installed mid-close cannot leak past the teardown.
    pub(crate) async fn close(&self) {
        info!("ws client closing");
        self.shutdown.send_replace(true);
        let _gate = self.reconnect_gate.lock().await;
        self.teardown().await;
    }

    pub(crate) fn touch_activity(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    fn elapsed_since_activity(&self) -> Duration {
        let last = self.last_activity_ms.load(Ordering::Acquire);
        let elapsed = Utc::now().timestamp_millis().saturating_sub(last);
        Duration::from_millis(elapsed.max(0) as u64)
    }

    fn install_reader(&self, reader: WsReader) {
        *self
            .reader_slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(reader);
    }

    fn take_reader(&self) -> Option<WsReader> {
        self.reader_slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }

    /// Read loop: one frame at a time for the lifetime of the client.
    ///
    /// With no transport installed the loop parks on the epoch watch instead
    /// of spinning. A transient read error is logged and reading continues;
    /// tearing down a silent connection is the staleness watcher's job.
    pub(crate) async fn run_read_loop(self: Arc<Self>, router: Arc<MessageRouter>) {
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut epoch_rx = self.epoch.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            epoch_rx.borrow_and_update();
            let Some(mut reader) = self.take_reader() else {
                tokio::select! {
                    changed = epoch_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                continue;
            };

            loop {
                tokio::select! {
                    changed = epoch_rx.changed() => {
                        // Transport replaced or torn down; this reader is stale
                        if changed.is_err() {
                            return;
                        }
                        break;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            return;
                        }
                    }
                    frame = reader.next() => {
                        match frame {
                            Some(Ok(message)) => self.handle_frame(message, &router),
                            Some(Err(err)) => {
                                debug!(error = %err, "ws read error");
                            }
                            None => {
                                info!("ws stream ended");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    fn handle_frame(&self, message: Message, router: &MessageRouter) {
        match message {
            Message::Text(text) => {
                self.touch_activity();
                router.route(text.as_str());
            }
            Message::Binary(bytes) => {
                self.touch_activity();
                match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => router.route(&text),
                    Err(_) => debug!(bytes = bytes.len(), "ws binary frame ignored"),
                }
            }
            Message::Ping(_) | Message::Pong(_) => {
                self.touch_activity();
            }
            Message::Close(_) => {
                debug!("ws close frame received");
            }
            _ => {}
        }
    }

    /// Keepalive loop: sends the literal `ping` frame on a fixed period.
    /// Runs for the lifetime of the client, across reconnects.
    pub(crate) async fn run_heartbeat(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown.subscribe();
        let period = self.config.heartbeat_interval;
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.send_text(TEXT_PING).await {
                        debug!(error = %err, "ws heartbeat skipped");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Staleness watcher: reconnects once silence exceeds the threshold.
    /// Runs for the lifetime of the client; inactive until the first
    /// successful connect.
    pub(crate) async fn run_staleness_watch(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown.subscribe();
        let period = self.config.staleness_tick;
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.ever_connected.load(Ordering::Acquire) {
                        continue;
                    }
                    let elapsed = self.elapsed_since_activity();
                    if elapsed > self.config.reconnect_threshold {
                        warn!(elapsed_ms = elapsed.as_millis() as u64, "ws connection silent");
                        self.reconnect().await;
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.config.endpoint)
            .field("state", &self.session_state())
            .finish()
    }
}
