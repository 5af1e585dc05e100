use thiserror::Error;

/// Rejected input for a ticker, date, bar or series.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker is empty")]
    EmptyTicker,
    #[error("ticker '{ticker}' is longer than {max} characters")]
    TickerTooLong { ticker: String, max: usize },
    #[error("ticker '{ticker}' has unsupported character '{ch}'")]
    TickerCharacter { ticker: String, ch: char },

    #[error("'{value}' is not a YYYY-MM-DD date")]
    InvalidDate { value: String },

    #[error("{field} is not a finite price")]
    NonFinitePrice { field: &'static str },
    #[error("{field} is negative")]
    NegativePrice { field: &'static str },
    #[error("bar high is below its low")]
    InvalidBarRange,
    #[error("bar open or close lies outside its high/low range")]
    InvalidBarBounds,

    #[error("bars out of order: {previous} is followed by {next}")]
    UnorderedBars { previous: String, next: String },
}
