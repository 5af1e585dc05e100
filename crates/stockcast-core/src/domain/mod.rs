//! # Domain Models
//!
//! Canonical domain types for stockcast price history.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PriceBar`] | Daily OHLCV bar |
//! | [`PriceSeries`] | Ordered bars for one symbol |
//! | [`Symbol`] | Validated ticker |
//! | [`TradingDate`] | Calendar day with business-day arithmetic |
//!
//! All types enforce their invariants at construction time:
//!
//! ```rust
//! use stockcast_core::{PriceBar, TradingDate, ValidationError};
//!
//! let date = TradingDate::parse("2024-01-02").unwrap();
//! let invalid = PriceBar::new(date, 100.0, 95.0, 105.0, 102.0, 1_000);
//! assert!(matches!(invalid, Err(ValidationError::InvalidBarRange)));
//! ```

mod date;
mod models;
mod symbol;

pub use date::TradingDate;
pub use models::{PriceBar, PriceSeries};
pub use symbol::Symbol;
