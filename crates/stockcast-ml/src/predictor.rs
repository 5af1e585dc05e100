//! Single-step predictor contract.

use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Descriptive metadata reported by a loaded predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub status: String,
    pub input_shape: String,
    pub output_shape: String,
    pub context_length: usize,
    pub features: Vec<String>,
    pub layers: Vec<String>,
    pub total_params: usize,
}

/// Maps a normalized window of `context_length()` closes to the next
/// normalized close.
///
/// Implementations are shared read-only across requests and must not keep
/// per-call state.
pub trait Predictor: Send + Sync {
    fn context_length(&self) -> usize;

    /// # Errors
    ///
    /// `InvalidWindow` when the window has the wrong length, contains a
    /// non-finite value, or the model produces a non-finite output.
    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError>;

    fn describe(&self) -> ModelInfo;
}

/// Shared input checks every predictor runs before inference.
pub fn validate_window(window: &[f64], context_length: usize) -> Result<(), ForecastError> {
    if window.len() != context_length {
        return Err(ForecastError::InvalidWindow(format!(
            "expected {context_length} values, got {}",
            window.len()
        )));
    }
    if let Some(index) = window.iter().position(|value| !value.is_finite()) {
        return Err(ForecastError::InvalidWindow(format!(
            "non-finite value at index {index}"
        )));
    }
    Ok(())
}

/// Rejects NaN or infinite model output.
pub fn validate_output(value: f64) -> Result<f64, ForecastError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::InvalidWindow(format!(
            "model produced non-finite output {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_length_and_finiteness_are_checked() {
        assert!(validate_window(&[0.1, 0.2, 0.3], 3).is_ok());
        assert!(matches!(
            validate_window(&[0.1, 0.2], 3),
            Err(ForecastError::InvalidWindow(_))
        ));
        assert!(matches!(
            validate_window(&[0.1, f64::INFINITY, 0.3], 3),
            Err(ForecastError::InvalidWindow(_))
        ));
    }

    #[test]
    fn non_finite_output_is_rejected() {
        assert_eq!(validate_output(0.5), Ok(0.5));
        assert!(validate_output(f64::NAN).is_err());
    }
}
