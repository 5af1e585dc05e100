use serde_json::Value;
use stockcast_web::dto::{PredictResponse, PredictionDto};
use stockcast_web::routes::FORECAST_LOOKBACK_DAYS;

use crate::cli::SymbolArgs;
use crate::error::CliError;

use super::{app_state, parse_symbol};

pub async fn run(args: &SymbolArgs) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let state = app_state(&args.service)?;
    let series = state.history(symbol, FORECAST_LOOKBACK_DAYS).await?;
    let prediction = state.forecaster().predict_next_day(&series)?;

    Ok(serde_json::to_value(PredictResponse {
        success: true,
        ticker: series.symbol().to_string(),
        prediction: PredictionDto::from(&prediction),
    })?)
}
