/*
[INPUT]:  Symbol identifiers and query parameters
[OUTPUT]: Market data (contracts, tickers, depth, fills, candles)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use serde::de::DeserializeOwned;

use crate::http::{BitgetError, RestClient, Result};
use crate::types::{ApiResponse, CandleRow, ContractInfo, Depth, Fill, SymbolPrice, Ticker};

const SUCCESS_CODE: &str = "00000";

impl RestClient {
    /// Query contract metadata
    ///
    /// GET /api/v2/mix/market/contracts?productType={productType}
    pub async fn contracts(&self, product_type: &str) -> Result<Vec<ContractInfo>> {
        self.market_get(
            "/api/v2/mix/market/contracts",
            &[("productType", product_type)],
        )
        .await
    }

    /// Query the 24h ticker for a symbol
    ///
    /// GET /api/v2/mix/market/ticker?symbol={symbol}&productType={productType}
    pub async fn ticker(&self, symbol: &str, product_type: &str) -> Result<Vec<Ticker>> {
        self.market_get(
            "/api/v2/mix/market/ticker",
            &[("symbol", symbol), ("productType", product_type)],
        )
        .await
    }

    /// Query an order book snapshot
    ///
    /// GET /api/v2/mix/market/orderbook?symbol={symbol}&productType={productType}
    pub async fn orderbook(
        &self,
        symbol: &str,
        product_type: &str,
        limit: Option<u32>,
    ) -> Result<Depth> {
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![("symbol", symbol), ("productType", product_type)];
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        self.market_get("/api/v2/mix/market/orderbook", &params).await
    }

    /// Query mark/index prices for a symbol
    ///
    /// GET /api/v2/mix/market/symbol-price?symbol={symbol}&productType={productType}
    pub async fn symbol_price(
        &self,
        symbol: &str,
        product_type: &str,
    ) -> Result<Vec<SymbolPrice>> {
        self.market_get(
            "/api/v2/mix/market/symbol-price",
            &[("symbol", symbol), ("productType", product_type)],
        )
        .await
    }

    /// Query recent public fills
    ///
    /// GET /api/v2/mix/market/fills?symbol={symbol}&productType={productType}
    pub async fn fills(
        &self,
        symbol: &str,
        product_type: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Fill>> {
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![("symbol", symbol), ("productType", product_type)];
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        self.market_get("/api/v2/mix/market/fills", &params).await
    }

    /// Query candle history
    ///
    /// GET /api/v2/mix/market/candles?symbol={symbol}&productType={productType}&granularity={granularity}
    pub async fn candles(
        &self,
        symbol: &str,
        product_type: &str,
        granularity: &str,
        limit: Option<u32>,
    ) -> Result<Vec<CandleRow>> {
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![
            ("symbol", symbol),
            ("productType", product_type),
            ("granularity", granularity),
        ];
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        self.market_get("/api/v2/mix/market/candles", &params).await
    }

    async fn market_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        // Error envelopes carry `"data": null`, so the payload is only typed
        // after the code check passes.
        let response: ApiResponse<serde_json::Value> = self.get_json(endpoint, params).await?;
        if response.code != SUCCESS_CODE {
            return Err(BitgetError::Api {
                code: response.code.parse().unwrap_or(-1),
                message: response.msg,
            });
        }
        serde_json::from_value(response.data).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::{BitgetError, ClientConfig, RestClient};

    async fn test_client(server: &MockServer) -> RestClient {
        RestClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init")
    }

    #[tokio::test]
    async fn test_ticker() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "00000",
            "msg": "success",
            "requestTime": 1700000000000,
            "data": [{
                "symbol": "BTCUSDT",
                "lastPr": "27000.5",
                "askPr": "27001.0",
                "bidPr": "27000.0",
                "high24h": "27500.0",
                "low24h": "26500.0",
                "baseVolume": "1200.5",
                "quoteVolume": "32400000.1",
                "indexPrice": "27000.2",
                "markPrice": "27000.3",
                "fundingRate": "0.0001",
                "ts": "1700000000000"
            }]
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v2/mix/market/ticker"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("productType", "USDT-FUTURES"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let tickers = client
            .ticker("BTCUSDT", "USDT-FUTURES")
            .await
            .expect("ticker failed");

        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].symbol, "BTCUSDT");
        assert_eq!(tickers[0].last_pr, "27000.5".parse().unwrap());
        assert_eq!(tickers[0].funding_rate, "0.0001".parse().unwrap());
    }

    #[tokio::test]
    async fn test_orderbook() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "00000",
            "msg": "success",
            "requestTime": 1700000000000,
            "data": {
                "asks": [["27001.0", "0.5"], ["27002.0", "1.1"]],
                "bids": [["27000.0", "0.7"]],
                "ts": "1700000000000"
            }
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v2/mix/market/orderbook"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("productType", "USDT-FUTURES"))
            .and(query_param("limit", "5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let depth = client
            .orderbook("BTCUSDT", "USDT-FUTURES", Some(5))
            .await
            .expect("orderbook failed");

        assert_eq!(depth.asks.len(), 2);
        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.asks[0].0, "27001.0".parse().unwrap());
    }

    #[tokio::test]
    async fn test_candles() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "00000",
            "msg": "success",
            "requestTime": 1700000000000,
            "data": [
                ["1700000000000", "27000", "27100", "26900", "27050", "12.5", "337500"]
            ]
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v2/mix/market/candles"))
            .and(query_param("granularity", "1m"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_raw(mock_response, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let candles = client
            .candles("BTCUSDT", "USDT-FUTURES", "1m", None)
            .await
            .expect("candles failed");

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0][1], "27000");
    }

    #[tokio::test]
    async fn test_error_envelope_surfaces_api_error() {
        let server = MockServer::start().await;
        let mock_response = r#"{
            "code": "40034",
            "msg": "Parameter does not exist",
            "requestTime": 1700000000000,
            "data": null
        }"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v2/mix/market/ticker"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_raw(mock_response, "application/json"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.ticker("NOPE", "USDT-FUTURES").await.unwrap_err();

        match err {
            BitgetError::Api { code, message } => {
                assert_eq!(code, 40034);
                assert_eq!(message, "Parameter does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
