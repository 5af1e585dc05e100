//! Recursive multi-day forecasting with widening confidence bands.
//!
//! Each step feeds the previous normalized prediction back into a sliding
//! [`WindowBuffer`], so day `i` depends on predictions `1..i`. Uncertainty is
//! approximated from realized volatility and grows with `sqrt(i)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stockcast_core::{PriceSeries, Symbol, TradingDate};
use tracing::debug;

use crate::predictor::{ModelInfo, Predictor};
use crate::preprocessing::{pct_returns, sample_std, MinMaxScaler};
use crate::window::WindowBuffer;
use crate::ForecastError;

pub const DEFAULT_CONFIDENCE_MULTIPLIER: f64 = 1.96;
pub const DEFAULT_MAX_HORIZON: usize = 30;

/// Share of daily volatility used to widen synthetic high/low around open/close.
pub const SYNTHETIC_SPREAD_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub confidence_multiplier: f64,
    pub max_horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence_multiplier: DEFAULT_CONFIDENCE_MULTIPLIER,
            max_horizon: DEFAULT_MAX_HORIZON,
        }
    }
}

/// One forecast day. Only `close` is a model output; open/high/low come from
/// a volatility heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub day: usize,
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub close_lower: f64,
    pub close_upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub latest_close: f64,
    pub final_predicted_close: f64,
    pub total_change: f64,
    pub total_change_percent: f64,
    pub trend: Trend,
    pub max_predicted_high: f64,
    pub min_predicted_low: f64,
    pub avg_predicted_close: f64,
    pub max_predicted_close: f64,
    pub min_predicted_close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub symbol: Symbol,
    pub horizon: usize,
    pub latest_date: TradingDate,
    pub points: Vec<ForecastPoint>,
    pub summary: ForecastSummary,
    pub daily_volatility: f64,
    pub confidence_multiplier: f64,
}

/// Next trading day's predicted close with its band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextDayPrediction {
    pub symbol: Symbol,
    pub prediction_date: TradingDate,
    pub predicted_close: f64,
    pub close_lower: f64,
    pub close_upper: f64,
    pub latest_date: TradingDate,
    pub latest_close: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Drives a [`Predictor`] recursively over a horizon.
#[derive(Clone)]
pub struct Forecaster {
    predictor: Arc<dyn Predictor>,
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(predictor: Arc<dyn Predictor>, config: ForecastConfig) -> Self {
        Self { predictor, config }
    }

    pub fn config(&self) -> ForecastConfig {
        self.config
    }

    pub fn context_length(&self) -> usize {
        self.predictor.context_length()
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }

    pub fn model_info(&self) -> ModelInfo {
        self.predictor.describe()
    }

    /// Bars a series must hold before any forecast is attempted.
    pub fn required_history(&self) -> usize {
        self.context_length() + 1
    }

    /// Forecasts `horizon` business days past the end of `history`.
    ///
    /// # Errors
    ///
    /// `InvalidHorizon` outside `1..=max_horizon`, `InsufficientHistory`
    /// below `context_length + 1` bars, `FlatSeries` when the trailing
    /// window is constant, and any predictor failure. A failing step aborts
    /// the whole forecast.
    pub fn forecast(&self, history: &PriceSeries, horizon: usize) -> Result<Forecast, ForecastError> {
        if horizon == 0 || horizon > self.config.max_horizon {
            return Err(ForecastError::InvalidHorizon {
                horizon: i64::try_from(horizon).unwrap_or(i64::MAX),
                max: self.config.max_horizon,
            });
        }

        let context_length = self.context_length();
        let required = self.required_history();
        let (Some(latest_close), Some(latest_date)) = (history.last_close(), history.last_date())
        else {
            return Err(ForecastError::InsufficientHistory {
                required,
                available: 0,
            });
        };
        if history.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                available: history.len(),
            });
        }

        let closes = history.closes();
        let trailing = &closes[closes.len() - context_length..];
        let (scaled, state) = MinMaxScaler::fit_and_scale(trailing)?;
        let daily_volatility = sample_std(&pct_returns(&closes));

        debug!(
            symbol = %history.symbol(),
            horizon,
            context_length,
            daily_volatility,
            "starting recursive forecast"
        );

        let mut window = WindowBuffer::from_slice(context_length, &scaled);
        let mut points = Vec::with_capacity(horizon);
        let mut previous_close = latest_close;
        let mut previous_date = latest_date;

        for day in 1..=horizon {
            let scaled_prediction = self.predictor.predict_next(&window.to_vec())?;
            // Prices floor at zero; the window carries the floored close.
            let close = state.inverse(scaled_prediction).max(0.0);
            window.push(state.transform(close));

            let open = previous_close;
            let spread = SYNTHETIC_SPREAD_FACTOR * daily_volatility * close;
            let high = open.max(close) + spread;
            let low = (open.min(close) - spread).max(0.0);

            let half_width = self.config.confidence_multiplier
                * daily_volatility
                * latest_close
                * (day as f64).sqrt();

            let date = previous_date.next_business_day();
            points.push(ForecastPoint {
                day,
                date,
                open,
                high,
                low,
                close,
                close_lower: close - half_width,
                close_upper: close + half_width,
            });

            previous_close = close;
            previous_date = date;
        }

        let summary = summarize(latest_close, &points);
        Ok(Forecast {
            symbol: history.symbol().clone(),
            horizon,
            latest_date,
            points,
            summary,
            daily_volatility,
            confidence_multiplier: self.config.confidence_multiplier,
        })
    }

    /// One-step forecast reshaped for the next trading day.
    pub fn predict_next_day(&self, history: &PriceSeries) -> Result<NextDayPrediction, ForecastError> {
        let forecast = self.forecast(history, 1)?;
        let point = forecast
            .points
            .first()
            .ok_or_else(|| ForecastError::InvalidWindow(String::from("empty forecast")))?;
        let latest_close = forecast.summary.latest_close;
        let change = point.close - latest_close;

        Ok(NextDayPrediction {
            symbol: forecast.symbol.clone(),
            prediction_date: point.date,
            predicted_close: point.close,
            close_lower: point.close_lower,
            close_upper: point.close_upper,
            latest_date: forecast.latest_date,
            latest_close,
            change,
            change_percent: percent_of(change, latest_close),
        })
    }
}

fn summarize(latest_close: f64, points: &[ForecastPoint]) -> ForecastSummary {
    let final_close = points.last().map_or(latest_close, |point| point.close);
    let total_change = final_close - latest_close;
    let closes: Vec<f64> = points.iter().map(|point| point.close).collect();

    ForecastSummary {
        latest_close,
        final_predicted_close: final_close,
        total_change,
        total_change_percent: percent_of(total_change, latest_close),
        trend: if final_close >= latest_close {
            Trend::Bullish
        } else {
            Trend::Bearish
        },
        max_predicted_high: points.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max),
        min_predicted_low: points.iter().map(|p| p.low).fold(f64::INFINITY, f64::min),
        avg_predicted_close: closes.iter().sum::<f64>() / closes.len().max(1) as f64,
        max_predicted_close: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_predicted_close: closes.iter().copied().fold(f64::INFINITY, f64::min),
    }
}

fn percent_of(change: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        change / base * 100.0
    }
}
