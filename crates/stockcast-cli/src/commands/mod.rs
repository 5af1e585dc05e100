mod forecast;
mod history;
mod indicators;
mod metrics;
mod model_info;
mod predict;
mod serve;

use serde_json::Value;
use stockcast_core::Symbol;
use stockcast_web::{AppState, ServiceConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Runs the selected command. Returns the JSON payload to print, or `None`
/// for commands that produce no output of their own.
pub async fn run(cli: &Cli) -> Result<Option<Value>, CliError> {
    let payload = match &cli.command {
        Command::Serve(args) => {
            serve::run(args).await?;
            return Ok(None);
        }
        Command::History(args) => history::run(args).await?,
        Command::Indicators(args) => indicators::run(args).await?,
        Command::Predict(args) => predict::run(args).await?,
        Command::Forecast(args) => forecast::run(args).await?,
        Command::Metrics(args) => metrics::run(args).await?,
        Command::ModelInfo(args) => model_info::run(args)?,
    };
    Ok(Some(payload))
}

fn parse_symbol(raw: &str) -> Result<Symbol, CliError> {
    Ok(Symbol::parse(raw)?)
}

/// Model plus provider, loaded the same way the server loads them.
fn app_state(service: &ServiceConfig) -> Result<AppState, CliError> {
    Ok(AppState::from_config(service.clone())?)
}
