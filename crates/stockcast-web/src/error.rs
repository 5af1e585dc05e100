use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockcast_core::{SourceError, SourceErrorKind, ValidationError};
use stockcast_ml::{ForecastError, IndicatorError};
use thiserror::Error;
use tracing::warn;

/// Every failure a handler can surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("export failed: {0}")]
    Export(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Source(error) => match error.kind() {
                SourceErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                SourceErrorKind::NotFound => StatusCode::NOT_FOUND,
                SourceErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                SourceErrorKind::Unavailable => StatusCode::BAD_GATEWAY,
                SourceErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forecast(error) => match error {
                ForecastError::InvalidHorizon { .. } => StatusCode::BAD_REQUEST,
                ForecastError::InsufficientHistory { .. }
                | ForecastError::FlatSeries { .. }
                | ForecastError::InvalidWindow(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ForecastError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Indicator(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::BadRequest(_) => "bad_request",
            Self::Source(error) => error.code(),
            Self::Forecast(ForecastError::InvalidHorizon { .. }) => "forecast.invalid_horizon",
            Self::Forecast(ForecastError::InsufficientHistory { .. }) => {
                "forecast.insufficient_history"
            }
            Self::Forecast(ForecastError::FlatSeries { .. }) => "forecast.flat_series",
            Self::Forecast(ForecastError::InvalidWindow(_)) => "forecast.invalid_window",
            Self::Forecast(ForecastError::ModelUnavailable(_)) => "forecast.model_unavailable",
            Self::Indicator(IndicatorError::InsufficientData { .. }) => {
                "indicator.insufficient_data"
            }
            Self::Indicator(IndicatorError::InvalidParameter(_)) => "indicator.invalid_parameter",
            Self::Export(_) => "export",
        }
    }
}

/// Failures that stop the server from starting or keep it from running.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("startup failed: {0}")]
    Startup(#[from] ApiError),

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::Symbol;

    #[test]
    fn maps_domain_errors_to_statuses() {
        let symbol = Symbol::parse("ZZZZ").expect("symbol");
        let cases = [
            (ApiError::from(ValidationError::EmptyTicker), StatusCode::BAD_REQUEST),
            (
                ApiError::from(ForecastError::InvalidHorizon { horizon: 0, max: 30 }),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(SourceError::not_found(&symbol)), StatusCode::NOT_FOUND),
            (
                ApiError::from(SourceError::rate_limited("budget")),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::from(SourceError::unavailable("down")), StatusCode::BAD_GATEWAY),
            (
                ApiError::from(ForecastError::InsufficientHistory {
                    required: 101,
                    available: 40,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(ForecastError::ModelUnavailable(String::from("missing"))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::Export(String::from("io")), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }

    #[test]
    fn source_codes_pass_through() {
        let error = ApiError::from(SourceError::unavailable("down"));
        assert_eq!(error.code(), "source.unavailable");
    }
}
