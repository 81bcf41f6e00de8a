/*
[INPUT]:  Error sources (HTTP, API, socket, signing, serialization)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Bitget adapter
#[derive(Error, Debug)]
pub enum BitgetError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Opening the socket connection failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Writing to the socket failed or no connection is active
    #[error("Send failed: {0}")]
    Send(String),

    /// Signing key is absent or malformed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Login was not confirmed within the configured wait
    #[error("Login not confirmed within {waited_ms}ms")]
    LoginTimeout { waited_ms: u64 },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BitgetError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BitgetError::Http(_)
                | BitgetError::Connection(_)
                | BitgetError::Send(_)
                | BitgetError::LoginTimeout { .. }
        )
    }

    /// Check if the error indicates an authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            BitgetError::Signing(_) | BitgetError::LoginTimeout { .. }
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        BitgetError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, BitgetError>;
