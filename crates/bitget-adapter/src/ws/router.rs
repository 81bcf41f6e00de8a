/*
[INPUT]:  Raw inbound text frames
[OUTPUT]: Dispatched callbacks and session-state transitions
[POS]:    WebSocket layer - frame classification and routing
[UPDATE]: When adding new frame kinds or changing dispatch rules
*/

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::ws::connection::SessionState;
use crate::ws::message::TEXT_PONG;
use crate::ws::subscription::{OnMessage, SubscriptionRegistry, Topic};

/// Classifies each inbound frame and dispatches it to the right handler.
///
/// Classification order mirrors the wire protocol: keepalive reply, error
/// code, login confirmation, data push, then the fallback for everything
/// else (subscription acks included).
pub(crate) struct MessageRouter {
    registry: Arc<SubscriptionRegistry>,
    listener: OnMessage,
    error_listener: OnMessage,
    fallback: RwLock<Option<OnMessage>>,
    state: Arc<watch::Sender<SessionState>>,
}

impl MessageRouter {
    pub(crate) fn new(
        registry: Arc<SubscriptionRegistry>,
        listener: OnMessage,
        error_listener: OnMessage,
        state: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        Self {
            registry,
            listener,
            error_listener,
            fallback: RwLock::new(None),
            state,
        }
    }

    /// Replace the fallback handler for unclassified frames
    pub(crate) fn set_fallback(&self, handler: OnMessage) {
        *self
            .fallback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    pub(crate) fn route(&self, raw: &str) {
        if raw == TEXT_PONG {
            trace!("ws keepalive acknowledged");
            return;
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, bytes = raw.len(), "ws frame parse failed");
                self.dispatch_fallback(raw);
                return;
            }
        };

        if let Some(code) = error_code(&value) {
            debug!(code, "ws error frame");
            (self.error_listener)(raw);
            return;
        }

        if value.get("event").and_then(Value::as_str) == Some("login") {
            info!("ws login confirmed");
            self.state.send_replace(SessionState::Authenticated);
            return;
        }

        if value.get("data").is_some() {
            match value.get("arg").and_then(|arg| topic_from_arg(arg)) {
                Some(topic) => {
                    match self.registry.lookup(&topic) {
                        Some(handler) => handler(raw),
                        None => (self.listener)(raw),
                    }
                    return;
                }
                None => {
                    debug!("ws data frame without topic argument");
                    self.dispatch_fallback(raw);
                    return;
                }
            }
        }

        self.dispatch_fallback(raw);
    }

    fn dispatch_fallback(&self, raw: &str) {
        let handler = self
            .fallback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(raw),
            None => debug!(bytes = raw.len(), "ws frame unhandled"),
        }
    }
}

/// Non-zero error code carried by a frame, if any.
///
/// The wire encodes codes both as numbers and as numeric strings.
fn error_code(value: &Value) -> Option<i64> {
    let code = value.get("code")?;
    let code = match code {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    (code != 0).then_some(code)
}

fn topic_from_arg(arg: &Value) -> Option<Topic> {
    serde_json::from_value::<Topic>(arg.clone())
        .ok()
        .map(|topic| topic.normalized())
}
