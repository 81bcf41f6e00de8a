/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Url, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::auth::Signer;
use crate::config::{Credentials, REST_BASE_URL};
use crate::http::{BitgetError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// REST client for the exchange API.
///
/// Requests are sent unsigned until credentials are set; with credentials the
/// `ACCESS-*` header set is attached to every request.
#[derive(Debug)]
pub struct RestClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl RestClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, REST_BASE_URL)
    }

    /// Create a new client against an explicit base URL (test seam)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            credentials: None,
        })
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// GET returning the raw response body
    pub async fn get_raw(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let path = request_path(endpoint, params);
        let url = self.base_url.join(&path)?;
        let builder = self.http_client.get(url);
        let builder = self.apply_auth(builder, "GET", &path, "")?;
        self.send_text(builder).await
    }

    /// POST with a JSON body, returning the raw response body
    pub async fn post_raw(&self, endpoint: &str, body: &serde_json::Value) -> Result<String> {
        // Serialize once so the signed bytes match the bytes sent
        let body_text = serde_json::to_string(body)?;
        let url = self.base_url.join(endpoint)?;
        let builder = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body_text.clone());
        let builder = self.apply_auth(builder, "POST", endpoint, &body_text)?;
        self.send_text(builder).await
    }

    /// GET deserialized into a typed response
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let text = self.get_raw(endpoint, params).await?;
        serde_json::from_str(&text).map_err(Into::into)
    }

    fn apply_auth(
        &self,
        builder: RequestBuilder,
        method: &str,
        path_with_query: &str,
        body: &str,
    ) -> Result<RequestBuilder> {
        let Some(credentials) = &self.credentials else {
            return Ok(builder);
        };

        let signer = Signer::new(credentials.scheme, &credentials.secret_key)?;
        let timestamp = Utc::now().timestamp_millis();
        let sign = signer.sign(method, path_with_query, body, timestamp);

        Ok(builder
            .header("ACCESS-KEY", credentials.api_key.as_str())
            .header("ACCESS-SIGN", sign)
            .header("ACCESS-TIMESTAMP", timestamp.to_string())
            .header("ACCESS-PASSPHRASE", credentials.passphrase.as_str())
            .header("locale", "en-US"))
    }

    async fn send_text(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BitgetError::api_error(status, text));
        }
        Ok(text)
    }
}

fn request_path(endpoint: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{endpoint}?{}", query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_without_params() {
        assert_eq!(
            request_path("/api/v2/mix/market/contracts", &[]),
            "/api/v2/mix/market/contracts"
        );
    }

    #[test]
    fn test_request_path_with_params() {
        let path = request_path(
            "/api/v2/mix/market/ticker",
            &[("symbol", "BTCUSDT"), ("productType", "USDT-FUTURES")],
        );
        assert_eq!(
            path,
            "/api/v2/mix/market/ticker?symbol=BTCUSDT&productType=USDT-FUTURES"
        );
    }
}
