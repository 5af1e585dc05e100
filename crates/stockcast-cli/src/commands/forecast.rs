use serde_json::Value;
use stockcast_web::dto::{ForecastBody, ForecastResponse};
use stockcast_web::export::forecast_csv;
use stockcast_web::routes::FORECAST_LOOKBACK_DAYS;
use tracing::info;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::{app_state, parse_symbol};

pub async fn run(args: &ForecastArgs) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let state = app_state(&args.service)?;
    let series = state.history(symbol, FORECAST_LOOKBACK_DAYS).await?;
    let forecast = state.forecaster().forecast(&series, args.horizon)?;

    if let Some(path) = &args.csv {
        std::fs::write(path, forecast_csv(&forecast)?)?;
        info!(path = %path.display(), "forecast table written");
    }

    Ok(serde_json::to_value(ForecastResponse {
        success: true,
        ticker: forecast.symbol.to_string(),
        body: ForecastBody::from(&forecast),
    })?)
}
