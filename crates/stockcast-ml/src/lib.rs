//! # Stockcast ML
//!
//! Numerical core of stockcast: normalization, single-step inference,
//! recursive multi-day forecasting, technical indicators and walk-forward
//! evaluation. Everything here is synchronous and request-scoped; the only
//! long-lived value is the loaded predictor.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`preprocessing`] | Min-max scaling and return helpers |
//! | [`predictor`] | `Predictor` trait and model metadata |
//! | [`lstm`] | JSON-artifact LSTM runtime on `ndarray` |
//! | [`window`] | Sliding window buffer |
//! | [`forecaster`] | Recursive forecaster with confidence bands |
//! | [`indicators`] | Moving averages, RSI, Bollinger bands, risk summaries |
//! | [`metrics`] | Walk-forward accuracy metrics |

pub mod error;
pub mod forecaster;
pub mod indicators;
pub mod lstm;
pub mod metrics;
pub mod predictor;
pub mod preprocessing;
pub mod window;

pub use error::{ForecastError, IndicatorError};
pub use forecaster::{
    Forecast, ForecastConfig, ForecastPoint, ForecastSummary, Forecaster, NextDayPrediction,
    Trend, DEFAULT_CONFIDENCE_MULTIPLIER, DEFAULT_MAX_HORIZON,
};
pub use indicators::{ChartData, IndicatorBundle, RsiSignal};
pub use lstm::{LstmArtifact, LstmPredictor};
pub use metrics::{evaluate, EvaluationReport, ModelMetrics};
pub use predictor::{ModelInfo, Predictor};
pub use preprocessing::{MinMaxScaler, NormalizationState};
pub use window::WindowBuffer;
