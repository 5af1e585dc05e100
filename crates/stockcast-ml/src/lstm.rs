//! In-process LSTM inference over a JSON weight artifact.
//!
//! The artifact mirrors a Keras `Sequential` model: one or more `LSTM`
//! layers followed by `Dense` layers. LSTM weights use the Keras layout,
//! gates concatenated in the order input, forget, cell, output:
//!
//! | Field | Shape |
//! |-------|-------|
//! | `kernel` | `[input_dim, 4 * units]` |
//! | `recurrent_kernel` | `[units, 4 * units]` |
//! | `bias` | `[4 * units]` |
//!
//! Dense layers hold `kernel` `[input_dim, output_dim]` and `bias`
//! `[output_dim]`. The last dense layer must have a single output.

use std::path::Path;

use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::predictor::{validate_output, validate_window, ModelInfo, Predictor};
use crate::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, values: Array1<f64>) -> Array1<f64> {
        match self {
            Self::Linear => values,
            Self::Relu => values.mapv(|v| v.max(0.0)),
            Self::Sigmoid => values.mapv(sigmoid),
            Self::Tanh => values.mapv(f64::tanh),
        }
    }
}

/// Serialized LSTM layer weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayerSpec {
    pub units: usize,
    pub kernel: Vec<Vec<f64>>,
    pub recurrent_kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Serialized dense layer weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayerSpec {
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default = "default_activation")]
    pub activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Linear
}

/// On-disk model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmArtifact {
    #[serde(default = "default_name")]
    pub name: String,
    pub context_length: usize,
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    pub lstm_layers: Vec<LstmLayerSpec>,
    pub dense_layers: Vec<DenseLayerSpec>,
}

fn default_name() -> String {
    String::from("lstm")
}

fn default_features() -> Vec<String> {
    vec![String::from("Close")]
}

#[derive(Debug, Clone)]
struct LstmLayer {
    units: usize,
    kernel: Array2<f64>,
    recurrent_kernel: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmLayer {
    /// Runs the layer over a whole sequence and returns every hidden state.
    fn forward_sequence(&self, inputs: &[Array1<f64>]) -> Vec<Array1<f64>> {
        let h_units = self.units;
        let mut h = Array1::<f64>::zeros(h_units);
        let mut c = Array1::<f64>::zeros(h_units);
        let mut outputs = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = x.dot(&self.kernel) + h.dot(&self.recurrent_kernel) + &self.bias;

            let i_gate = z.slice(s![0..h_units]).mapv(sigmoid);
            let f_gate = z.slice(s![h_units..2 * h_units]).mapv(sigmoid);
            let g = z.slice(s![2 * h_units..3 * h_units]).mapv(f64::tanh);
            let o_gate = z.slice(s![3 * h_units..4 * h_units]).mapv(sigmoid);

            c = &f_gate * &c + &i_gate * &g;
            h = &o_gate * &c.mapv(f64::tanh);
            outputs.push(h.clone());
        }

        outputs
    }

    fn parameter_count(&self) -> usize {
        self.kernel.len() + self.recurrent_kernel.len() + self.bias.len()
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    kernel: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        self.activation.apply(input.dot(&self.kernel) + &self.bias)
    }
}

/// Stacked LSTM with a dense head. Immutable after load.
#[derive(Debug, Clone)]
pub struct LstmPredictor {
    name: String,
    context_length: usize,
    features: Vec<String>,
    lstm_layers: Vec<LstmLayer>,
    dense_layers: Vec<DenseLayer>,
}

impl LstmPredictor {
    /// Loads and validates a JSON artifact.
    ///
    /// # Errors
    ///
    /// Every failure (missing file, malformed JSON, inconsistent shapes) is
    /// reported as [`ForecastError::ModelUnavailable`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::ModelUnavailable(format!("cannot read '{}': {e}", path.display()))
        })?;
        let artifact: LstmArtifact = serde_json::from_str(&raw).map_err(|e| {
            ForecastError::ModelUnavailable(format!("cannot parse '{}': {e}", path.display()))
        })?;

        let predictor = Self::from_artifact(artifact)?;
        info!(
            path = %path.display(),
            context_length = predictor.context_length,
            lstm_layers = predictor.lstm_layers.len(),
            params = predictor.parameter_count(),
            "loaded LSTM artifact"
        );
        Ok(predictor)
    }

    /// Loads an artifact and checks it was trained on `context_length` steps.
    pub fn load_expecting(
        path: impl AsRef<Path>,
        context_length: usize,
    ) -> Result<Self, ForecastError> {
        let predictor = Self::load(path)?;
        if predictor.context_length != context_length {
            return Err(ForecastError::ModelUnavailable(format!(
                "artifact context length {} does not match configured {context_length}",
                predictor.context_length
            )));
        }
        Ok(predictor)
    }

    pub fn from_artifact(artifact: LstmArtifact) -> Result<Self, ForecastError> {
        if artifact.context_length == 0 {
            return Err(unavailable("context_length must be positive"));
        }
        if artifact.lstm_layers.is_empty() {
            return Err(unavailable("artifact has no LSTM layers"));
        }
        if artifact.dense_layers.is_empty() {
            return Err(unavailable("artifact has no dense layers"));
        }
        // Windows carry one normalized close per step.
        if artifact.features.len() != 1 {
            return Err(unavailable(format!(
                "artifact expects {} input features {:?}, only a single close is supplied",
                artifact.features.len(),
                artifact.features
            )));
        }

        let mut input_dim = 1;
        let mut lstm_layers = Vec::with_capacity(artifact.lstm_layers.len());
        for (index, spec) in artifact.lstm_layers.into_iter().enumerate() {
            let units = spec.units;
            if units == 0 {
                return Err(unavailable(format!("lstm layer {index} has zero units")));
            }
            let kernel = to_matrix(&spec.kernel, (input_dim, 4 * units), "lstm kernel", index)?;
            let recurrent_kernel = to_matrix(
                &spec.recurrent_kernel,
                (units, 4 * units),
                "lstm recurrent_kernel",
                index,
            )?;
            let bias = to_vector(spec.bias, 4 * units, "lstm bias", index)?;

            lstm_layers.push(LstmLayer {
                units,
                kernel,
                recurrent_kernel,
                bias,
            });
            input_dim = units;
        }

        let mut dense_layers = Vec::with_capacity(artifact.dense_layers.len());
        for (index, spec) in artifact.dense_layers.into_iter().enumerate() {
            let output_dim = spec.bias.len();
            let kernel = to_matrix(&spec.kernel, (input_dim, output_dim), "dense kernel", index)?;
            let bias = to_vector(spec.bias, output_dim, "dense bias", index)?;
            dense_layers.push(DenseLayer {
                kernel,
                bias,
                activation: spec.activation,
            });
            input_dim = output_dim;
        }

        if input_dim != 1 {
            return Err(unavailable(format!(
                "final dense layer must have one output, has {input_dim}"
            )));
        }

        Ok(Self {
            name: artifact.name,
            context_length: artifact.context_length,
            features: artifact.features,
            lstm_layers,
            dense_layers,
        })
    }

    pub fn parameter_count(&self) -> usize {
        self.lstm_layers
            .iter()
            .map(LstmLayer::parameter_count)
            .sum::<usize>()
            + self
                .dense_layers
                .iter()
                .map(|layer| layer.kernel.len() + layer.bias.len())
                .sum::<usize>()
    }

    fn infer(&self, window: &[f64]) -> f64 {
        let mut sequence: Vec<Array1<f64>> = window
            .iter()
            .map(|value| Array1::from_elem(1, *value))
            .collect();

        for layer in &self.lstm_layers {
            sequence = layer.forward_sequence(&sequence);
        }

        let last_units = self.lstm_layers[self.lstm_layers.len() - 1].units;
        let mut hidden = sequence
            .pop()
            .unwrap_or_else(|| Array1::zeros(last_units));
        for layer in &self.dense_layers {
            hidden = layer.forward(&hidden);
        }

        hidden.get(0).copied().unwrap_or(f64::NAN)
    }
}

impl Predictor for LstmPredictor {
    fn context_length(&self) -> usize {
        self.context_length
    }

    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError> {
        validate_window(window, self.context_length)?;
        validate_output(self.infer(window))
    }

    fn describe(&self) -> ModelInfo {
        let mut layers: Vec<String> = self
            .lstm_layers
            .iter()
            .map(|layer| format!("LSTM({})", layer.units))
            .collect();
        layers.extend(
            self.dense_layers
                .iter()
                .map(|layer| format!("Dense({}, {:?})", layer.bias.len(), layer.activation)),
        );

        ModelInfo {
            name: self.name.clone(),
            status: String::from("loaded"),
            input_shape: format!("(None, {}, 1)", self.context_length),
            output_shape: String::from("(None, 1)"),
            context_length: self.context_length,
            features: self.features.clone(),
            layers,
            total_params: self.parameter_count(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn unavailable(message: impl Into<String>) -> ForecastError {
    ForecastError::ModelUnavailable(message.into())
}

fn to_matrix(
    rows: &[Vec<f64>],
    shape: (usize, usize),
    what: &str,
    index: usize,
) -> Result<Array2<f64>, ForecastError> {
    if rows.len() != shape.0 || rows.iter().any(|row| row.len() != shape.1) {
        return Err(unavailable(format!(
            "{what} of layer {index} must be {}x{}",
            shape.0, shape.1
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec(shape, flat)
        .map_err(|e| unavailable(format!("{what} of layer {index}: {e}")))
}

fn to_vector(
    values: Vec<f64>,
    len: usize,
    what: &str,
    index: usize,
) -> Result<Array1<f64>, ForecastError> {
    if values.len() != len {
        return Err(unavailable(format!(
            "{what} of layer {index} must have {len} values, has {}",
            values.len()
        )));
    }
    Ok(Array1::from_vec(values))
}
