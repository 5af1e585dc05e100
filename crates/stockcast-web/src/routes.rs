//! Request handlers. Each request runs end to end inside its handler: fetch
//! through the cached provider, compute synchronously, serialize.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use std::sync::Arc;

use stockcast_core::{
    market_status, search_tickers, PriceSeries, SourceError, Symbol, MAX_LOOKBACK_DAYS,
};
use stockcast_ml::indicators::chart_data;
use stockcast_ml::metrics::MAX_EVALUATION_STEPS;
use stockcast_ml::{evaluate, EvaluationReport, Forecast, ForecastError, IndicatorBundle};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::dto::{
    AnalysisResponse, ChartPayload, CompareEntry, CompareRequest, CompareResponse,
    DashboardQuery, DashboardResponse, DaysQuery, ForecastBody, ForecastRequest,
    ForecastResponse, HealthResponse, IndicatorsResponse, LatestPrice, LatestResponse,
    MarketStatusResponse, MetricsQuery, MetricsResponse, ModelInfoResponse, ModelPerformance,
    PredictResponse, PredictionDto, QuickForecastResponse, QuickQuery, RiskAnalysis,
    SearchQuery, SearchResponse, StockInfo, StockInfoResponse, StockResponse, SummaryDto,
    TechnicalAnalysis, TickerRequest, ValidateResponse, ANALYSIS_HORIZON, DEFAULT_ANALYSIS_DAYS,
    DEFAULT_CHART_DAYS, DEFAULT_HORIZON, DEFAULT_SEARCH_LIMIT, DEFAULT_TICKER, DISCLAIMER,
    MAX_COMPARE_TICKERS, MAX_QUICK_HORIZON, MIN_CHART_DAYS,
};
use crate::error::ApiError;
use crate::export;
use crate::state::AppState;

/// Calendar lookback fetched for predictions and forecasts.
pub const FORECAST_LOOKBACK_DAYS: u32 = 365;
/// Calendar lookback fetched for walk-forward metrics.
pub const METRICS_LOOKBACK_DAYS: u32 = 730;
/// Extra calendar days fetched ahead of a chart so its first points have
/// warm moving averages.
pub const CHART_WARMUP_DAYS: u32 = 90;
/// Extra calendar days fetched ahead of an analysis window.
pub const ANALYSIS_WARMUP_DAYS: u32 = 60;
/// Calendar lookback behind the 52-week figures of a stock profile.
pub const STOCK_INFO_LOOKBACK_DAYS: u32 = 365;
pub const MAX_SEARCH_LIMIT: usize = 30;

fn parse_ticker(raw: Option<&str>) -> Result<Symbol, ApiError> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
    Ok(Symbol::parse(raw.unwrap_or(DEFAULT_TICKER))?)
}

fn chart_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_CHART_DAYS)
        .clamp(MIN_CHART_DAYS, MAX_LOOKBACK_DAYS)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn check_horizon(state: &AppState, requested: Option<i64>) -> Result<usize, ApiError> {
    let max = state.config().max_horizon;
    let horizon = requested.unwrap_or(DEFAULT_HORIZON);
    usize::try_from(horizon)
        .ok()
        .filter(|days| (1..=max).contains(days))
        .ok_or_else(|| ForecastError::InvalidHorizon { horizon, max }.into())
}

/// Out-of-range quick horizons are clamped, never rejected.
fn quick_horizon(requested: Option<i64>, max_horizon: usize) -> usize {
    let max = MAX_QUICK_HORIZON.min(max_horizon).max(1);
    let requested = requested.unwrap_or(DEFAULT_HORIZON).max(1);
    usize::try_from(requested).map_or(max, |days| days.min(max))
}

fn check_steps(steps: Option<usize>) -> Result<Option<usize>, ApiError> {
    match steps {
        Some(steps) if !(1..=MAX_EVALUATION_STEPS).contains(&steps) => Err(ApiError::BadRequest(
            format!("steps must be within 1..={MAX_EVALUATION_STEPS}, got {steps}"),
        )),
        steps => Ok(steps),
    }
}

/// Number of trailing bars dated within `days` calendar days of the last bar.
fn bars_within(series: &PriceSeries, days: u32) -> usize {
    let Some(last) = series.last_date() else {
        return 0;
    };
    let cutoff = last.minus_days(i64::from(days));
    series.bars().iter().filter(|bar| bar.date > cutoff).count()
}

async fn chart_history(
    state: &AppState,
    symbol: Symbol,
    days: u32,
) -> Result<(Arc<PriceSeries>, usize), ApiError> {
    let lookback = (days + CHART_WARMUP_DAYS).min(MAX_LOOKBACK_DAYS);
    let series = state.history(symbol, lookback).await?;
    let keep = bars_within(&series, days);
    Ok((series, keep))
}

/// `GET /api/stock/:ticker`
pub async fn stock_history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<StockResponse>, ApiError> {
    let params = query(params)?;
    let symbol = parse_ticker(Some(&ticker))?;
    let days = chart_days(params.days);

    let (series, keep) = chart_history(&state, symbol, days).await?;
    let chart = chart_data(&series, Some(keep))?;

    Ok(Json(StockResponse {
        success: true,
        ticker: series.symbol().to_string(),
        data: ChartPayload::from(chart),
    }))
}

async fn stock_profile(state: &AppState, symbol: Symbol) -> Result<StockInfo, ApiError> {
    let series = state.history(symbol.clone(), STOCK_INFO_LOOKBACK_DAYS).await?;
    StockInfo::from_series(&series).ok_or_else(|| ApiError::Source(SourceError::not_found(&symbol)))
}

/// `GET /api/stock/:ticker/info`
pub async fn stock_info(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<StockInfoResponse>, ApiError> {
    let symbol = parse_ticker(Some(&ticker))?;
    let info = stock_profile(&state, symbol).await?;

    Ok(Json(StockInfoResponse {
        success: true,
        info,
    }))
}

/// `GET /api/stock/:ticker/latest`
pub async fn latest_price(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<LatestResponse>, ApiError> {
    let symbol = parse_ticker(Some(&ticker))?;
    // A week of calendar days always spans at least two sessions.
    let series = state.history(symbol.clone(), 7).await?;
    let data = LatestPrice::from_series(&series)
        .ok_or_else(|| ApiError::Source(SourceError::not_found(&symbol)))?;

    Ok(Json(LatestResponse {
        success: true,
        data,
    }))
}

/// `GET /api/stock/:ticker/indicators`
pub async fn indicators(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<IndicatorsResponse>, ApiError> {
    let params = query(params)?;
    let symbol = parse_ticker(Some(&ticker))?;
    let series = state.history(symbol, chart_days(params.days)).await?;
    let bundle = IndicatorBundle::compute(&series)?;

    Ok(Json(IndicatorsResponse {
        success: true,
        ticker: series.symbol().to_string(),
        indicators: bundle,
    }))
}

/// `POST /api/predict`
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<TickerRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request = json_body(body)?;
    let symbol = parse_ticker(request.ticker.as_deref())?;
    let series = state.history(symbol, FORECAST_LOOKBACK_DAYS).await?;
    let prediction = state.forecaster().predict_next_day(&series)?;

    Ok(Json(PredictResponse {
        success: true,
        ticker: series.symbol().to_string(),
        prediction: PredictionDto::from(&prediction),
    }))
}

async fn run_forecast(
    state: &AppState,
    request: ForecastRequest,
) -> Result<(Arc<PriceSeries>, Forecast), ApiError> {
    let horizon = check_horizon(state, request.horizon)?;
    forecast_ticker(state, request.ticker.as_deref(), horizon).await
}

async fn forecast_ticker(
    state: &AppState,
    ticker: Option<&str>,
    horizon: usize,
) -> Result<(Arc<PriceSeries>, Forecast), ApiError> {
    let symbol = parse_ticker(ticker)?;
    let series = state.history(symbol, FORECAST_LOOKBACK_DAYS).await?;
    let forecast = state.forecaster().forecast(&series, horizon)?;
    info!(
        symbol = %forecast.symbol,
        horizon,
        final_close = forecast.summary.final_predicted_close,
        "forecast generated"
    );
    Ok((series, forecast))
}

/// `POST /api/forecast`
pub async fn forecast(
    State(state): State<AppState>,
    body: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let (_, forecast) = run_forecast(&state, json_body(body)?).await?;

    Ok(Json(ForecastResponse {
        success: true,
        ticker: forecast.symbol.to_string(),
        body: ForecastBody::from(&forecast),
    }))
}

async fn evaluate_ticker(
    state: &AppState,
    symbol: Symbol,
    steps: Option<usize>,
) -> Result<EvaluationReport, ApiError> {
    let series = state.history(symbol, METRICS_LOOKBACK_DAYS).await?;
    Ok(evaluate(state.forecaster().predictor().as_ref(), &series, steps)?)
}

/// `GET /api/metrics/:ticker`
pub async fn metrics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let params = query(params)?;
    let steps = check_steps(params.steps)?;
    let symbol = parse_ticker(Some(&ticker))?;
    let report = evaluate_ticker(&state, symbol.clone(), steps).await?;

    Ok(Json(MetricsResponse::new(symbol.to_string(), report)))
}

/// `GET /api/quick/:ticker`
pub async fn quick_forecast(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<QuickQuery>, QueryRejection>,
) -> Result<Json<QuickForecastResponse>, ApiError> {
    let params = query(params)?;
    let horizon = quick_horizon(params.horizon, state.config().max_horizon);
    let (_, forecast) = forecast_ticker(&state, Some(ticker.as_str()), horizon).await?;

    Ok(Json(QuickForecastResponse::new(&forecast)))
}

/// `GET /api/analysis/:ticker`
///
/// Indicator sections fail the request like `/indicators` does; the model
/// sections degrade to `null` with a warning.
pub async fn analysis(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let params = query(params)?;
    let symbol = parse_ticker(Some(&ticker))?;
    let days = params
        .days
        .unwrap_or(DEFAULT_ANALYSIS_DAYS)
        .clamp(MIN_CHART_DAYS, MAX_LOOKBACK_DAYS);

    let lookback = (days + ANALYSIS_WARMUP_DAYS).min(MAX_LOOKBACK_DAYS);
    let series = state.history(symbol.clone(), lookback).await?;
    let IndicatorBundle {
        trend,
        volatility,
        returns,
        support_resistance,
        rsi,
    } = IndicatorBundle::compute(&series)?;
    let stock_info = stock_profile(&state, symbol.clone()).await?;

    let mut warnings = Vec::new();
    let model_performance = match evaluate_ticker(&state, symbol.clone(), None).await {
        Ok(report) => Some(ModelPerformance::from(report)),
        Err(error) => {
            warnings.push(format!("model performance unavailable: {error}"));
            None
        }
    };
    let horizon = ANALYSIS_HORIZON.min(state.config().max_horizon);
    let forecast = match forecast_ticker(&state, Some(symbol.as_str()), horizon).await {
        Ok((_, forecast)) => Some(ForecastBody::from(&forecast)),
        Err(error) => {
            warn!(%symbol, %error, "analysis forecast failed");
            warnings.push(format!("forecast unavailable: {error}"));
            None
        }
    };

    Ok(Json(AnalysisResponse {
        success: true,
        ticker: symbol.to_string(),
        stock_info,
        technical_analysis: TechnicalAnalysis {
            trend,
            rsi,
            support_resistance,
        },
        risk_analysis: RiskAnalysis {
            volatility,
            returns,
        },
        model_performance,
        forecast,
        warnings,
        disclaimer: DISCLAIMER,
    }))
}

/// `GET /api/dashboard/:ticker`
///
/// Only a failed history fetch fails the request; every derived section
/// degrades to `null` with a warning.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let params = query(params)?;
    let symbol = parse_ticker(Some(&ticker))?;
    let days = chart_days(params.days);
    let horizon = check_horizon(&state, params.horizon)?;

    let lookback = (days + CHART_WARMUP_DAYS)
        .max(FORECAST_LOOKBACK_DAYS)
        .min(MAX_LOOKBACK_DAYS);
    let series = state.history(symbol, lookback).await?;
    let mut warnings = Vec::new();

    let chart = match chart_data(&series, Some(bars_within(&series, days))) {
        Ok(chart) => Some(ChartPayload::from(chart)),
        Err(error) => {
            warnings.push(format!("chart data unavailable: {error}"));
            None
        }
    };
    let indicators = match IndicatorBundle::compute(&series) {
        Ok(bundle) => Some(bundle),
        Err(error) => {
            warnings.push(format!("indicators unavailable: {error}"));
            None
        }
    };
    let forecast = match state.forecaster().forecast(&series, horizon) {
        Ok(forecast) => Some(forecast),
        Err(error) => {
            warn!(symbol = %series.symbol(), %error, "dashboard forecast failed");
            warnings.push(format!("forecast unavailable: {error}"));
            None
        }
    };
    // The next-day prediction is day one of the forecast.
    let prediction = match forecast.as_ref() {
        Some(_) => state
            .forecaster()
            .predict_next_day(&series)
            .ok()
            .map(|p| PredictionDto::from(&p)),
        None => None,
    };

    Ok(Json(DashboardResponse {
        success: true,
        ticker: series.symbol().to_string(),
        latest: LatestPrice::from_series(&series),
        chart_data: chart,
        indicators,
        prediction,
        forecast: forecast.as_ref().map(ForecastBody::from),
        warnings,
        disclaimer: DISCLAIMER,
    }))
}

/// `POST /api/compare`
pub async fn compare(
    State(state): State<AppState>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let request = json_body(body)?;
    if request.tickers.is_empty() || request.tickers.len() > MAX_COMPARE_TICKERS {
        return Err(ApiError::BadRequest(format!(
            "provide between 1 and {MAX_COMPARE_TICKERS} tickers, got {}",
            request.tickers.len()
        )));
    }
    let horizon = check_horizon(&state, request.horizon)?;

    let mut results = Vec::with_capacity(request.tickers.len());
    for ticker in request.tickers {
        let outcome = forecast_ticker(&state, Some(ticker.as_str()), horizon).await;

        results.push(match outcome {
            Ok((series, forecast)) => CompareEntry {
                ticker: forecast.symbol.to_string(),
                success: true,
                latest: LatestPrice::from_series(&series),
                summary: Some(SummaryDto::from(&forecast.summary)),
                error: None,
            },
            Err(error) => CompareEntry {
                ticker: ticker.trim().to_ascii_uppercase(),
                success: false,
                latest: None,
                summary: None,
                error: Some(error.to_string()),
            },
        });
    }

    Ok(Json(CompareResponse {
        success: true,
        horizon,
        results,
    }))
}

/// `GET /api/validate/:ticker`
pub async fn validate_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Json<ValidateResponse> {
    let raw = ticker.trim().to_ascii_uppercase();
    let symbol = match Symbol::parse(&ticker) {
        Ok(symbol) => symbol,
        Err(error) => {
            return Json(ValidateResponse {
                success: true,
                ticker: raw,
                valid: false,
                message: format!("invalid ticker format: {error}"),
            });
        }
    };

    // A week of calendar days always spans a session for a listed ticker.
    let (valid, message) = match state.history(symbol.clone(), 7).await {
        Ok(series) if !series.is_empty() => (true, format!("valid ticker: {symbol}")),
        Ok(_) => (false, format!("no recent prices for {symbol}")),
        Err(error) => (false, error.to_string()),
    };

    Json(ValidateResponse {
        success: true,
        ticker: symbol.to_string(),
        valid,
        message,
    })
}

/// `GET /api/market/status`
pub async fn market() -> Json<MarketStatusResponse> {
    Json(MarketStatusResponse {
        success: true,
        status: market_status(OffsetDateTime::now_utc()),
    })
}

/// `GET /api/model/info`
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let config = state.forecaster().config();
    Json(ModelInfoResponse {
        success: true,
        model: state.forecaster().model_info(),
        confidence_multiplier: config.confidence_multiplier,
        max_horizon: config.max_horizon,
    })
}

/// `GET /api/search`
pub async fn search(
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let params = query(params)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let results = search_tickers(&params.q, limit)
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(SearchResponse {
        success: true,
        query: params.q,
        results,
    }))
}

/// `POST /api/download/csv`
pub async fn download_csv(
    State(state): State<AppState>,
    body: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (_, forecast) = run_forecast(&state, json_body(body)?).await?;
    let now = OffsetDateTime::now_utc();
    let bytes = export::forecast_csv(&forecast)?;
    Ok(export::attachment(
        export::filename(&forecast.symbol, "forecast", now),
        bytes,
    ))
}

/// `POST /api/download/report`
pub async fn download_report(
    State(state): State<AppState>,
    body: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (series, forecast) = run_forecast(&state, json_body(body)?).await?;
    let latest = LatestPrice::from_series(&series);
    let indicators = IndicatorBundle::compute(&series).ok();

    let now = OffsetDateTime::now_utc();
    let bytes = export::report_csv(latest.as_ref(), &forecast, indicators.as_ref(), now)?;
    Ok(export::attachment(
        export::filename(&forecast.symbol, "report", now),
        bytes,
    ))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: true,
        provider: state.provider_id(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
