use serde_json::Value;
use stockcast_core::HistoryRequest;
use stockcast_ml::IndicatorBundle;
use stockcast_web::dto::IndicatorsResponse;
use stockcast_web::state::provider_from_config;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::parse_symbol;

pub async fn run(args: &HistoryArgs) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let request = HistoryRequest::new(symbol, args.days)?;
    let series = provider_from_config(&args.service).history(request).await?;
    let indicators = IndicatorBundle::compute(&series)?;

    Ok(serde_json::to_value(IndicatorsResponse {
        success: true,
        ticker: series.symbol().to_string(),
        indicators,
    })?)
}
