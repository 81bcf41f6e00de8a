/*
[INPUT]:  Endpoint URLs, credentials, and session tuning knobs
[OUTPUT]: Per-instance client configuration
[POS]:    Configuration layer - explicit setup for REST and socket clients
[UPDATE]: When adding new configuration options
*/

use std::fmt;
use std::time::Duration;

use crate::auth::SignScheme;

/// Default REST base URL
pub const REST_BASE_URL: &str = "https://api.bitget.com";

/// Default push-channel endpoint
pub const WS_URL: &str = "wss://ws.bitget.com/mix/v1/stream";

/// API credentials shared by the REST and socket clients
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub passphrase: String,
    pub secret_key: String,
    pub scheme: SignScheme,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        passphrase: impl Into<String>,
        secret_key: impl Into<String>,
        scheme: SignScheme,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            passphrase: passphrase.into(),
            secret_key: secret_key.into(),
            scheme,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("passphrase", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Socket session configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Push-channel endpoint URL
    pub endpoint: String,
    /// Credentials for the login envelope (required when `need_login`)
    pub credentials: Option<Credentials>,
    /// Whether the session must authenticate before use
    pub need_login: bool,
    /// Keepalive send period
    pub heartbeat_interval: Duration,
    /// Staleness check period
    pub staleness_tick: Duration,
    /// Silence duration that triggers a reconnect
    pub reconnect_threshold: Duration,
    /// Bounded wait for login confirmation
    pub login_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            endpoint: WS_URL.to_string(),
            credentials: None,
            need_login: false,
            heartbeat_interval: Duration::from_secs(15),
            staleness_tick: Duration::from_secs(15),
            reconnect_threshold: Duration::from_secs(60),
            login_timeout: Duration::from_secs(10),
        }
    }
}

impl WsConfig {
    /// Configuration for an authenticated session
    pub fn with_login(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials: Some(credentials),
            need_login: true,
            ..Self::default()
        }
    }
}
