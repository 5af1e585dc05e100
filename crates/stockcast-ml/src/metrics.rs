//! Walk-forward evaluation of a predictor against a persistence baseline.

use serde::{Deserialize, Serialize};
use stockcast_core::PriceSeries;
use tracing::debug;

use crate::predictor::Predictor;
use crate::preprocessing::{mean, MinMaxScaler};
use crate::ForecastError;

/// Fewest evaluation steps accepted.
pub const MIN_EVALUATION_STEPS: usize = 10;
/// Most evaluation steps a caller may ask for.
pub const MAX_EVALUATION_STEPS: usize = 1_000;
/// Share of the series replayed when no explicit step count is given.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error, percent.
    pub mape: f64,
    pub naive_rmse: f64,
    /// `(1 - rmse / naive_rmse) * 100`; `None` when the baseline is exact.
    pub skill_score: Option<f64>,
    /// Share of steps with the right predicted direction, percent.
    pub directional_accuracy: f64,
    pub residual_std: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsInterpretation {
    pub beats_naive: bool,
    pub model_quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub test_samples: usize,
    pub metrics: ModelMetrics,
    pub interpretation: MetricsInterpretation,
}

/// Default step count for a series of `len` bars.
pub fn default_steps(len: usize) -> usize {
    ((len as f64 * DEFAULT_TEST_FRACTION) as usize).max(MIN_EVALUATION_STEPS)
}

/// Replays the last `steps` bars one at a time. Each prediction sees only
/// the actual closes before it, normalized on that trailing window.
///
/// # Errors
///
/// `InsufficientHistory` when the series holds fewer than
/// `context_length + steps` bars, plus any scaling or predictor failure.
pub fn evaluate(
    predictor: &dyn Predictor,
    series: &PriceSeries,
    steps: Option<usize>,
) -> Result<EvaluationReport, ForecastError> {
    let context_length = predictor.context_length();
    let steps = steps.unwrap_or_else(|| default_steps(series.len())).max(1);
    // Every replayed bar needs a full window and a prior actual close.
    let replayable = series.len().saturating_sub(context_length.max(1));
    if steps > replayable {
        return Err(ForecastError::InsufficientHistory {
            required: context_length.max(1).saturating_add(steps),
            available: series.len(),
        });
    }

    let closes = series.closes();
    let first = closes.len() - steps;
    let mut predicted = Vec::with_capacity(steps);

    for t in first..closes.len() {
        let window = &closes[t - context_length..t];
        let (scaled, state) = MinMaxScaler::fit_and_scale(window)?;
        let next = predictor.predict_next(&scaled)?;
        predicted.push(state.inverse(next));
    }

    let actual = &closes[first..];
    let previous = &closes[first - 1..closes.len() - 1];
    debug!(symbol = %series.symbol(), steps, "walk-forward evaluation complete");

    Ok(report(actual, previous, &predicted))
}

fn report(actual: &[f64], previous: &[f64], predicted: &[f64]) -> EvaluationReport {
    let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let naive_residuals: Vec<f64> = actual.iter().zip(previous).map(|(a, p)| a - p).collect();

    let rmse = root_mean_square(&residuals);
    let naive_rmse = root_mean_square(&naive_residuals);
    let mae = mean(&residuals.iter().map(|r| r.abs()).collect::<Vec<_>>());
    let mape = mean(
        &actual
            .iter()
            .zip(&residuals)
            .filter(|(a, _)| **a != 0.0)
            .map(|(a, r)| (r / a).abs())
            .collect::<Vec<_>>(),
    ) * 100.0;

    let hits = actual
        .iter()
        .zip(predicted)
        .zip(previous)
        .filter(|((a, p), prev)| direction(**a - **prev) == direction(**p - **prev))
        .count();
    let directional_accuracy = hits as f64 / actual.len().max(1) as f64 * 100.0;

    let skill = (naive_rmse > 0.0).then(|| 1.0 - rmse / naive_rmse);

    EvaluationReport {
        test_samples: actual.len(),
        metrics: ModelMetrics {
            rmse,
            mae,
            mape,
            naive_rmse,
            skill_score: skill.map(|s| s * 100.0),
            directional_accuracy,
            residual_std: population_std(&residuals),
        },
        interpretation: MetricsInterpretation {
            beats_naive: rmse < naive_rmse,
            model_quality: interpret_skill(skill).to_owned(),
        },
    }
}

pub fn interpret_skill(skill: Option<f64>) -> &'static str {
    match skill {
        Some(s) if s > 0.3 => "Excellent - Significantly beats baseline",
        Some(s) if s > 0.15 => "Good - Beats baseline",
        Some(s) if s > 0.0 => "Fair - Slightly beats baseline",
        _ => "Poor - Does not beat baseline",
    }
}

fn direction(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

fn root_mean_square(values: &[f64]) -> f64 {
    mean(&values.iter().map(|v| v * v).collect::<Vec<_>>()).sqrt()
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>()).sqrt()
}
