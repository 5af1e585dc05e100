//! # Stockcast Core
//!
//! Domain types and market-data plumbing for the stockcast forecasting service.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Price history providers (Yahoo live + offline) |
//! | [`cache`] | Short-TTL series cache and read-through provider |
//! | [`catalog`] | Popular ticker catalog for search |
//! | [`data_source`] | Provider trait, request and error types |
//! | [`domain`] | `Symbol`, `TradingDate`, `PriceBar`, `PriceSeries` |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`market`] | Regular-session hours in New York time |
//! | [`throttling`] | Outbound request budget |

pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market;
pub mod throttling;

pub use adapters::YahooProvider;
pub use cache::{CachedProvider, SeriesCache};
pub use catalog::{search_tickers, POPULAR_TICKERS};
pub use data_source::{
    HistoryRequest, PriceHistoryProvider, SourceError, SourceErrorKind, MAX_LOOKBACK_DAYS,
    MIN_LOOKBACK_DAYS,
};
pub use domain::{PriceBar, PriceSeries, Symbol, TradingDate};
pub use error::ValidationError;
pub use http_client::{
    CannedHttpClient, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use market::{market_status, MarketStatus};
pub use throttling::Throttle;
