//! Command-line definitions for `stockcast`.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the JSON API |
//! | `history` | Fetch daily bars |
//! | `indicators` | Technical indicator summary |
//! | `predict` | Next trading day close |
//! | `forecast` | Multi-day forecast with confidence bands |
//! | `metrics` | Walk-forward accuracy against the naive baseline |
//! | `model-info` | Describe the loaded model |
//!
//! Every command accepts the service options (`--model-path`, `--offline`,
//! ...) and their `STOCKCAST_*` environment variables.
//!
//! ```bash
//! stockcast forecast AAPL --horizon 10 --pretty
//! stockcast serve --bind 0.0.0.0:5000 --static-dir ./web
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stockcast_ml::metrics::MAX_EVALUATION_STEPS;
use stockcast_web::ServiceConfig;

/// Stockcast - LSTM stock forecasting service
#[derive(Debug, Parser)]
#[command(name = "stockcast", author, version, about = "LSTM stock forecast service and CLI")]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API (and an optional static front end).
    Serve(ServeArgs),

    /// Fetch daily OHLCV bars.
    ///
    ///   stockcast history MSFT --days 90
    History(HistoryArgs),

    /// Trend, volatility, returns, pivots and RSI for a symbol.
    Indicators(HistoryArgs),

    /// Predict the next trading day's close.
    Predict(SymbolArgs),

    /// Forecast several trading days ahead.
    ///
    ///   stockcast forecast NVDA --horizon 10 --csv nvda.csv
    Forecast(ForecastArgs),

    /// Replay recent history and score the model against persistence.
    Metrics(MetricsArgs),

    /// Describe the model artifact.
    ModelInfo(ServiceArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    pub symbol: String,

    /// Calendar days of history to fetch.
    #[arg(long, default_value_t = 365)]
    pub days: u32,

    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Args)]
pub struct SymbolArgs {
    pub symbol: String,

    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Args)]
pub struct ForecastArgs {
    pub symbol: String,

    /// Trading days to forecast.
    #[arg(long, default_value_t = 5)]
    pub horizon: usize,

    /// Also write the forecast table to this CSV file.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Args)]
pub struct MetricsArgs {
    pub symbol: String,

    /// Walk-forward steps; defaults to a fifth of the fetched history.
    #[arg(long, value_parser = parse_steps)]
    pub steps: Option<usize>,

    #[command(flatten)]
    pub service: ServiceConfig,
}

fn parse_steps(raw: &str) -> Result<usize, String> {
    let steps: usize = raw.parse().map_err(|e| format!("{e}"))?;
    if (1..=MAX_EVALUATION_STEPS).contains(&steps) {
        Ok(steps)
    } else {
        Err(format!("must be within 1..={MAX_EVALUATION_STEPS}"))
    }
}
