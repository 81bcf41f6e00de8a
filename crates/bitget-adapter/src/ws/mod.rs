/*
[INPUT]:  Session configuration and subscription topics
[OUTPUT]: A managed push-channel session with routed callbacks
[POS]:    WebSocket layer - session/subscription engine
[UPDATE]: When adding new operations or changing connection logic
*/

pub mod client;
pub mod connection;
pub mod message;
pub mod router;
pub mod subscription;

pub use client::BitgetWsClient;
pub use connection::SessionState;
pub use message::{LoginArg, TEXT_PING, TEXT_PONG, WsArg, WsOp, WsRequest};
pub use subscription::{OnMessage, Topic};
