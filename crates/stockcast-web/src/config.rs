use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use stockcast_ml::{ForecastConfig, DEFAULT_CONFIDENCE_MULTIPLIER, DEFAULT_MAX_HORIZON};

pub const DEFAULT_MODEL_PATH: &str = "models/stock_prediction_model.json";
pub const DEFAULT_CONTEXT_LENGTH: usize = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PROVIDER_RATE: u32 = 100;

/// Runtime options for the service. Every field can come from a flag or
/// from its `STOCKCAST_*` environment variable.
#[derive(Debug, Clone, Args)]
pub struct ServiceConfig {
    /// LSTM weight artifact (JSON).
    #[arg(long, env = "STOCKCAST_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Window length the artifact was trained on.
    #[arg(long, env = "STOCKCAST_CONTEXT_LENGTH", default_value_t = DEFAULT_CONTEXT_LENGTH)]
    pub context_length: usize,

    /// z-score applied to the volatility band.
    #[arg(long, env = "STOCKCAST_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_MULTIPLIER)]
    pub confidence: f64,

    #[arg(long, env = "STOCKCAST_MAX_HORIZON", default_value_t = DEFAULT_MAX_HORIZON)]
    pub max_horizon: usize,

    /// Price series cache lifetime; 0 disables caching.
    #[arg(long, env = "STOCKCAST_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "STOCKCAST_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Upstream request timeout.
    #[arg(long, env = "STOCKCAST_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Upstream requests allowed per minute.
    #[arg(long, env = "STOCKCAST_PROVIDER_RATE", default_value_t = DEFAULT_PROVIDER_RATE)]
    pub provider_rate: u32,

    /// Serve deterministic synthetic prices instead of calling Yahoo.
    #[arg(long, env = "STOCKCAST_OFFLINE", default_value_t = false)]
    pub offline: bool,

    /// Directory with a static front end served at `/`.
    #[arg(long, env = "STOCKCAST_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            context_length: DEFAULT_CONTEXT_LENGTH,
            confidence: DEFAULT_CONFIDENCE_MULTIPLIER,
            max_horizon: DEFAULT_MAX_HORIZON,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            provider_rate: DEFAULT_PROVIDER_RATE,
            offline: false,
            static_dir: None,
        }
    }
}

impl ServiceConfig {
    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            confidence_multiplier: self.confidence,
            max_horizon: self.max_horizon,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: ServiceConfig,
    }

    #[test]
    fn defaults_match_documented_values() {
        let parsed = Harness::try_parse_from(["stockcast"]).expect("defaults parse");
        let defaults = ServiceConfig::default();

        assert_eq!(parsed.config.model_path, defaults.model_path);
        assert_eq!(parsed.config.context_length, 100);
        assert_eq!(parsed.config.max_horizon, 30);
        assert_eq!(parsed.config.bind, defaults.bind);
        assert_eq!(parsed.config.cache_ttl(), Duration::from_secs(300));
        assert!((parsed.config.confidence - 1.96).abs() < f64::EPSILON);
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = Harness::try_parse_from([
            "stockcast",
            "--context-length",
            "60",
            "--offline",
            "--bind",
            "0.0.0.0:8080",
        ])
        .expect("flags parse");

        assert_eq!(parsed.config.context_length, 60);
        assert!(parsed.config.offline);
        assert_eq!(parsed.config.bind.port(), 8080);
    }
}
