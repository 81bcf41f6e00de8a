/*
[INPUT]:  API schema definitions
[OUTPUT]: Shared data types for REST and socket layers
[POS]:    Data layer - module wiring
[UPDATE]: When adding new type modules
*/

pub mod models;

pub use models::{
    ApiResponse,
    CandleRow,
    ContractInfo,
    Depth,
    DepthLevel,
    Fill,
    SymbolPrice,
    Ticker,
};
