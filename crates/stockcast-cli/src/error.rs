use stockcast_core::{SourceError, ValidationError};
use stockcast_ml::{ForecastError, IndicatorError};
use stockcast_web::{ApiError, ServeError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Source(_) => 3,
            Self::Serialization(_) => 4,
            Self::Forecast(ForecastError::ModelUnavailable(_)) => 6,
            Self::Forecast(_) | Self::Indicator(_) => 5,
            Self::Io(_) => 10,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Validation(error) => Self::Validation(error),
            ApiError::Source(error) => Self::Source(error),
            ApiError::Forecast(error) => Self::Forecast(error),
            ApiError::Indicator(error) => Self::Indicator(error),
            ApiError::BadRequest(message) | ApiError::Export(message) => Self::Command(message),
        }
    }
}

impl From<ServeError> for CliError {
    fn from(error: ServeError) -> Self {
        match error {
            ServeError::Startup(error) => error.into(),
            ServeError::Io(error) => Self::Io(error),
        }
    }
}
