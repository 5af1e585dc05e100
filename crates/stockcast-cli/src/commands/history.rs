use serde::Serialize;
use serde_json::Value;
use stockcast_core::{HistoryRequest, PriceBar};
use stockcast_web::dto::LatestPrice;
use stockcast_web::state::provider_from_config;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::parse_symbol;

#[derive(Debug, Serialize)]
struct HistoryResponseData<'a> {
    ticker: String,
    count: usize,
    latest: Option<LatestPrice>,
    bars: &'a [PriceBar],
}

pub async fn run(args: &HistoryArgs) -> Result<Value, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let request = HistoryRequest::new(symbol, args.days)?;
    let series = provider_from_config(&args.service).history(request).await?;

    Ok(serde_json::to_value(HistoryResponseData {
        ticker: series.symbol().to_string(),
        count: series.len(),
        latest: LatestPrice::from_series(&series),
        bars: series.bars(),
    })?)
}
