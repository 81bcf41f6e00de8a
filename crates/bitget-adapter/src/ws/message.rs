/*
[INPUT]:  Operations, topics, and credentials
[OUTPUT]: Wire-format JSON envelopes for the push channel
[POS]:    WebSocket layer - outbound message construction
[UPDATE]: When the wire protocol changes
*/

use serde::{Deserialize, Serialize};

use crate::http::Result;
use crate::ws::subscription::Topic;

/// Outbound keepalive frame
pub const TEXT_PING: &str = "ping";
/// Inbound keepalive reply
pub const TEXT_PONG: &str = "pong";

/// Fixed method/path signed for the login envelope
pub const LOGIN_SIGN_METHOD: &str = "GET";
pub const LOGIN_SIGN_PATH: &str = "/user/verify";

/// Operation carried by an outbound envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WsOp {
    Login,
    Subscribe,
    Unsubscribe,
}

/// Credential argument of the login envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginArg {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub sign: String,
}

/// One argument of an outbound envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WsArg {
    Login(LoginArg),
    Topic(Topic),
}

/// Outbound envelope: `{"op": ..., "args": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsRequest {
    pub op: WsOp,
    pub args: Vec<WsArg>,
}

impl WsRequest {
    pub fn login(arg: LoginArg) -> Self {
        Self {
            op: WsOp::Login,
            args: vec![WsArg::Login(arg)],
        }
    }

    pub fn subscribe(topics: &[Topic]) -> Self {
        Self {
            op: WsOp::Subscribe,
            args: topics.iter().cloned().map(WsArg::Topic).collect(),
        }
    }

    pub fn unsubscribe(topics: &[Topic]) -> Self {
        Self {
            op: WsOp::Unsubscribe,
            args: topics.iter().cloned().map(WsArg::Topic).collect(),
        }
    }

    /// Serialize to the wire text frame
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}
