/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Bitget adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{SignScheme, Signer};

// Re-export configuration
pub use config::{Credentials, REST_BASE_URL, WS_URL, WsConfig};

// Re-export commonly used types from http
pub use http::{BitgetError, ClientConfig, RestClient, Result};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    BitgetWsClient,
    OnMessage,
    SessionState,
    Topic,
    WsRequest,
};
