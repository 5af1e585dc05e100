//! Min-max normalization and return helpers.

use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Scaling bounds fit from one window of closes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationState {
    pub min: f64,
    pub max: f64,
}

impl NormalizationState {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }
}

/// Stateless min-max scaler onto `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxScaler;

impl MinMaxScaler {
    /// Fits bounds on `values` and returns the scaled copy with its state.
    ///
    /// # Errors
    ///
    /// `InsufficientHistory` for empty input, `InvalidWindow` for non-finite
    /// values and `FlatSeries` when every value is equal.
    pub fn fit_and_scale(values: &[f64]) -> Result<(Vec<f64>, NormalizationState), ForecastError> {
        let state = Self::fit(values)?;
        let scaled = values.iter().map(|value| state.transform(*value)).collect();
        Ok((scaled, state))
    }

    pub fn fit(values: &[f64]) -> Result<NormalizationState, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }

        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(ForecastError::InvalidWindow(format!(
                "non-finite value at index {index}"
            )));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == min {
            return Err(ForecastError::FlatSeries { value: min });
        }

        Ok(NormalizationState { min, max })
    }
}

/// Simple daily returns `(p[t] - p[t-1]) / p[t-1]`; one element shorter than the input.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                0.0
            } else {
                (pair[1] - pair[0]) / pair[0]
            }
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); zero below two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_onto_unit_interval_and_inverts() {
        let closes = [10.0, 15.0, 20.0, 12.5];
        let (scaled, state) = MinMaxScaler::fit_and_scale(&closes).expect("fit");

        assert_eq!(scaled, vec![0.0, 0.5, 1.0, 0.25]);
        for (raw, s) in closes.iter().zip(&scaled) {
            assert!((state.inverse(*s) - raw).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_flat_empty_and_non_finite_input() {
        assert_eq!(
            MinMaxScaler::fit(&[3.0, 3.0, 3.0]),
            Err(ForecastError::FlatSeries { value: 3.0 })
        );
        assert!(matches!(
            MinMaxScaler::fit(&[]),
            Err(ForecastError::InsufficientHistory { .. })
        ));
        assert!(matches!(
            MinMaxScaler::fit(&[1.0, f64::NAN]),
            Err(ForecastError::InvalidWindow(_))
        ));
    }

    #[test]
    fn computes_simple_returns_and_guards_zero_prices() {
        let returns = pct_returns(&[100.0, 110.0, 99.0]);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);

        assert_eq!(pct_returns(&[0.0, 5.0]), vec![0.0]);
    }

    #[test]
    fn sample_std_uses_bessel_correction() {
        assert!((sample_std(&[1.0, 2.0, 3.0, 4.0]) - 1.290_994_448_7).abs() < 1e-9);
        assert_eq!(sample_std(&[5.0]), 0.0);
    }
}
