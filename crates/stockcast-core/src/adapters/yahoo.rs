use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, PriceHistoryProvider, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::Throttle;
use crate::{PriceBar, PriceSeries, Symbol, TradingDate};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Clone)]
enum Mode {
    Live {
        http_client: Arc<dyn HttpClient>,
        timeout_ms: u64,
    },
    /// Deterministic synthetic history; no network access.
    Offline { end_date: Option<TradingDate> },
}

/// Daily history from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooProvider {
    mode: Mode,
    throttle: Throttle,
}

impl YahooProvider {
    pub fn live(http_client: Arc<dyn HttpClient>, timeout_ms: u64, throttle: Throttle) -> Self {
        Self {
            mode: Mode::Live {
                http_client,
                timeout_ms,
            },
            throttle,
        }
    }

    /// Synthetic random-walk history seeded by the symbol, ending today.
    pub fn offline() -> Self {
        Self {
            mode: Mode::Offline { end_date: None },
            throttle: Throttle::per_minute(u32::MAX),
        }
    }

    /// Synthetic history pinned to a fixed final date.
    pub fn offline_until(end_date: TradingDate) -> Self {
        Self {
            mode: Mode::Offline {
                end_date: Some(end_date),
            },
            throttle: Throttle::per_minute(u32::MAX),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.mode, Mode::Offline { .. })
    }

    async fn fetch_live(
        &self,
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
        req: &HistoryRequest,
    ) -> Result<PriceSeries, SourceError> {
        let today = TradingDate::today();
        let period1 = today.minus_days(i64::from(req.lookback_days)).unix_midnight();
        let period2 = today.unix_midnight() + 86_400;

        let endpoint = format!(
            "{CHART_ENDPOINT}/{}?period1={period1}&period2={period2}&interval=1d&events=history",
            urlencoding::encode(req.symbol.as_str()),
        );

        let request = HttpRequest::get(endpoint, Duration::from_millis(timeout_ms))
            .header("referer", "https://finance.yahoo.com/")
            .header("accept", "application/json");

        let response = http_client.execute(request).await.map_err(|e| {
            warn!(symbol = %req.symbol, error = %e, "yahoo transport failure");
            SourceError::unavailable(format!("yahoo {e}"))
        })?;

        match response.status {
            404 => return Err(SourceError::not_found(&req.symbol)),
            429 => {
                return Err(SourceError::rate_limited(
                    "yahoo responded with status 429",
                ))
            }
            status if !response.is_success() => {
                warn!(symbol = %req.symbol, status, "yahoo returned error status");
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )));
            }
            _ => {}
        }

        parse_chart(&req.symbol, &response.body)
    }

    fn fetch_offline(
        &self,
        end_date: Option<TradingDate>,
        req: &HistoryRequest,
    ) -> Result<PriceSeries, SourceError> {
        let end = end_date.unwrap_or_else(TradingDate::today);
        let start = end.minus_days(i64::from(req.lookback_days));
        let mut rng = fastrand::Rng::with_seed(symbol_seed(&req.symbol));

        let mut previous_close = 40.0 + (symbol_seed(&req.symbol) % 400) as f64;
        let mut bars = Vec::new();
        let mut date = start;
        while date <= end {
            if !date.is_weekend() {
                // Sum of three uniforms gives a bell-shaped daily move.
                let shock = (rng.f64() + rng.f64() + rng.f64() - 1.5) / 1.5;
                let daily_return = 0.0004 + 0.02 * shock;
                let open = previous_close * (1.0 + 0.004 * (rng.f64() - 0.5));
                let close = (previous_close * (1.0 + daily_return)).max(0.01);
                let high = open.max(close) * (1.0 + 0.01 * rng.f64());
                let low = open.min(close) * (1.0 - 0.01 * rng.f64());
                let volume = 1_000_000 + rng.u64(0..4_000_000);

                bars.push(
                    PriceBar::new(date, open, high, low, close, volume)
                        .map_err(|e| SourceError::internal(e.to_string()))?,
                );
                previous_close = close;
            }
            date = date.next_business_day();
        }

        if bars.is_empty() {
            return Err(SourceError::not_found(&req.symbol));
        }

        PriceSeries::new(req.symbol.clone(), bars).map_err(|e| SourceError::internal(e.to_string()))
    }
}

impl PriceHistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        if self.is_offline() {
            "yahoo-offline"
        } else {
            "yahoo"
        }
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.throttle.acquire()?;
            debug!(symbol = %req.symbol, lookback = req.lookback_days, provider = self.id(), "fetching history");

            match &self.mode {
                Mode::Live {
                    http_client,
                    timeout_ms,
                } => self.fetch_live(http_client, *timeout_ms, &req).await,
                Mode::Offline { end_date } => self.fetch_offline(*end_date, &req),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

fn parse_chart(symbol: &Symbol, body: &str) -> Result<PriceSeries, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = &chart_response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(SourceError::not_found(symbol));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} {}",
            error.code, error.description
        )));
    }

    let Some(result) = chart_response
        .chart
        .result
        .as_ref()
        .and_then(|results| results.first())
    else {
        return Err(SourceError::not_found(symbol));
    };

    let utc_offset = result
        .meta
        .as_ref()
        .and_then(|meta| meta.gmtoffset)
        .unwrap_or(0);
    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let Some(quote) = result.indicators.quote.first() else {
        return Err(SourceError::not_found(symbol));
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0_usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(date) = TradingDate::from_unix_timestamp(ts, utc_offset) else {
            skipped += 1;
            continue;
        };

        // Only rows with a full OHLC set become bars.
        if let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) {
            let volume = quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .map_or(0, |v| v.max(0) as u64);

            match PriceBar::new(date, *open, *high, *low, *close, volume) {
                Ok(bar) => bars.push(bar),
                Err(_) => skipped += 1,
            }
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        debug!(%symbol, skipped, "dropped incomplete yahoo rows");
    }

    if bars.is_empty() {
        return Err(SourceError::not_found(symbol));
    }

    Ok(PriceSeries::from_unordered(symbol.clone(), bars))
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}
