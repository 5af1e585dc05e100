use thiserror::Error;

/// Errors raised by preprocessing, inference and forecasting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("insufficient history: need at least {required} bars, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid input window: {0}")]
    InvalidWindow(String),

    #[error("cannot normalize a flat series (min == max == {value})")]
    FlatSeries { value: f64 },

    #[error("horizon must be within 1..={max}, got {horizon}")]
    InvalidHorizon { horizon: i64, max: usize },

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Errors raised by indicator calculations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("insufficient data: need at least {required} points, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid indicator parameter: {0}")]
    InvalidParameter(String),
}
