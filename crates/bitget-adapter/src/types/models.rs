/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs for REST responses
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Common REST response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub code: String,
    pub msg: String,
    #[serde(rename = "requestTime")]
    pub request_time: i64,
    pub data: T,
}

/// Contract metadata from the mix market
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContractInfo {
    pub symbol: String,
    #[serde(rename = "baseCoin")]
    pub base_coin: String,
    #[serde(rename = "quoteCoin")]
    pub quote_coin: String,
    #[serde(rename = "makerFeeRate", with = "rust_decimal::serde::str")]
    pub maker_fee_rate: Decimal,
    #[serde(rename = "takerFeeRate", with = "rust_decimal::serde::str")]
    pub taker_fee_rate: Decimal,
    #[serde(rename = "minTradeNum", with = "rust_decimal::serde::str")]
    pub min_trade_num: Decimal,
    #[serde(rename = "priceEndStep")]
    pub price_end_step: String,
    #[serde(rename = "volumePlace")]
    pub volume_place: String,
    #[serde(rename = "pricePlace")]
    pub price_place: String,
    #[serde(rename = "symbolStatus")]
    pub symbol_status: String,
}

/// 24h ticker snapshot
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ticker {
    pub symbol: String,
    #[serde(rename = "lastPr", with = "rust_decimal::serde::str")]
    pub last_pr: Decimal,
    #[serde(rename = "askPr", with = "rust_decimal::serde::str")]
    pub ask_pr: Decimal,
    #[serde(rename = "bidPr", with = "rust_decimal::serde::str")]
    pub bid_pr: Decimal,
    #[serde(rename = "high24h", with = "rust_decimal::serde::str")]
    pub high_24h: Decimal,
    #[serde(rename = "low24h", with = "rust_decimal::serde::str")]
    pub low_24h: Decimal,
    #[serde(rename = "baseVolume", with = "rust_decimal::serde::str")]
    pub base_volume: Decimal,
    #[serde(rename = "quoteVolume", with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
    #[serde(rename = "indexPrice", with = "rust_decimal::serde::str")]
    pub index_price: Decimal,
    #[serde(rename = "markPrice", with = "rust_decimal::serde::str")]
    pub mark_price: Decimal,
    #[serde(rename = "fundingRate", with = "rust_decimal::serde::str")]
    pub funding_rate: Decimal,
    pub ts: String,
}

/// One price level: (price, size)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepthLevel(
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
);

/// Order book snapshot
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Depth {
    pub asks: Vec<DepthLevel>,
    pub bids: Vec<DepthLevel>,
    pub ts: String,
}

/// Mark/index price snapshot
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SymbolPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "indexPrice", with = "rust_decimal::serde::str")]
    pub index_price: Decimal,
    #[serde(rename = "markPrice", with = "rust_decimal::serde::str")]
    pub mark_price: Decimal,
    pub ts: String,
}

/// Public trade fill
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Fill {
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
    pub side: String,
    pub ts: String,
}

/// Candle row as returned by the API: [ts, open, high, low, close, volumes...]
pub type CandleRow = Vec<String>;
