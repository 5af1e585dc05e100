use serde_json::Value;
use stockcast_ml::evaluate;
use stockcast_web::dto::MetricsResponse;
use stockcast_web::routes::METRICS_LOOKBACK_DAYS;

use crate::cli::MetricsArgs;
use crate::error::CliError;

use super::{app_state, parse_symbol};

pub async fn run(args: &MetricsArgs) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let state = app_state(&args.service)?;
    let series = state.history(symbol, METRICS_LOOKBACK_DAYS).await?;
    let report = evaluate(state.forecaster().predictor().as_ref(), &series, args.steps)?;

    Ok(serde_json::to_value(MetricsResponse::new(
        series.symbol().to_string(),
        report,
    ))?)
}
