//! Request and response bodies for the JSON API. Prices leave the service
//! rounded to cents.

use serde::{Deserialize, Serialize};
use stockcast_core::{MarketStatus, PriceSeries, TradingDate};
use stockcast_ml::indicators::{
    ChartData, ReturnsStatistics, RsiReading, SupportResistance, TrendSignal, VolatilityMetrics,
};
use stockcast_ml::metrics::MetricsInterpretation;
use stockcast_ml::{
    EvaluationReport, Forecast, ForecastPoint, ForecastSummary, IndicatorBundle, ModelMetrics,
    NextDayPrediction,
};

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_HORIZON: i64 = 5;
pub const DEFAULT_CHART_DAYS: u32 = 365;
pub const MIN_CHART_DAYS: u32 = 30;
pub const MAX_COMPARE_TICKERS: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_ANALYSIS_DAYS: u32 = 180;
pub const ANALYSIS_HORIZON: usize = 5;
/// Quick forecasts clamp their horizon into `1..=7` instead of rejecting it.
pub const MAX_QUICK_HORIZON: usize = 7;

pub const DISCLAIMER: &str = "This system provides analytical forecasts based on historical \
patterns. It does not constitute financial advice. Past performance is not indicative of future \
results. Always conduct your own research before making investment decisions.";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round2_opt(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.map(round2)).collect()
}

fn round2_all(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(round2).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub days: Option<u32>,
    pub horizon: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuickQuery {
    pub horizon: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    /// Walk-forward steps; defaults to a fifth of the series.
    pub steps: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TickerRequest {
    pub ticker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastRequest {
    pub ticker: Option<String>,
    /// Signed, so a negative horizon is reported as an invalid horizon.
    pub horizon: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub tickers: Vec<String>,
    pub horizon: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Ohlc {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct ChartIndicators {
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

/// Chart arrays grouped the way the dashboard front end reads them.
#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub dates: Vec<TradingDate>,
    pub ohlc: Ohlc,
    pub volume: Vec<u64>,
    pub indicators: ChartIndicators,
    pub volatility: Vec<Option<f64>>,
    pub returns: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl From<ChartData> for ChartPayload {
    fn from(chart: ChartData) -> Self {
        Self {
            ohlc: Ohlc {
                open: round2_all(&chart.open),
                high: round2_all(&chart.high),
                low: round2_all(&chart.low),
                close: round2_all(&chart.close),
            },
            indicators: ChartIndicators {
                ma20: round2_opt(&chart.ma20),
                ma50: round2_opt(&chart.ma50),
                bb_upper: round2_opt(&chart.bb_upper),
                bb_middle: round2_opt(&chart.bb_middle),
                bb_lower: round2_opt(&chart.bb_lower),
            },
            volatility: round2_opt(&chart.volatility),
            returns: round2_opt(&chart.returns),
            rsi: round2_opt(&chart.rsi),
            dates: chart.dates,
            volume: chart.volume,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub success: bool,
    pub ticker: String,
    pub data: ChartPayload,
}

/// Most recent bar with the move from the prior close.
#[derive(Debug, Clone, Serialize)]
pub struct LatestPrice {
    pub ticker: String,
    pub date: TradingDate,
    pub current_price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

impl LatestPrice {
    /// `None` for an empty series. A single-bar series reports no change.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let bars = series.bars();
        let last = bars.last()?;
        let previous_close = bars
            .len()
            .checked_sub(2)
            .map_or(last.close, |index| bars[index].close);
        let change = last.close - previous_close;
        let change_percent = if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Some(Self {
            ticker: series.symbol().to_string(),
            date: last.date,
            current_price: round2(last.close),
            open: round2(last.open),
            high: round2(last.high),
            low: round2(last.low),
            previous_close: round2(previous_close),
            change: round2(change),
            change_percent: round2(change_percent),
            volume: last.volume,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub success: bool,
    pub data: LatestPrice,
}

#[derive(Debug, Serialize)]
pub struct IndicatorsResponse {
    pub success: bool,
    pub ticker: String,
    pub indicators: IndicatorBundle,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastPointDto {
    pub day: usize,
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub close_lower: f64,
    pub close_upper: f64,
}

impl From<&ForecastPoint> for ForecastPointDto {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            day: point.day,
            date: point.date,
            open: round2(point.open),
            high: round2(point.high),
            low: round2(point.low),
            close: round2(point.close),
            close_lower: round2(point.close_lower),
            close_upper: round2(point.close_upper),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryDto {
    pub latest_close: f64,
    pub final_predicted_close: f64,
    pub total_change: f64,
    pub total_change_percent: f64,
    pub trend: &'static str,
    pub max_predicted_high: f64,
    pub min_predicted_low: f64,
    pub avg_predicted_close: f64,
    pub max_predicted_close: f64,
    pub min_predicted_close: f64,
}

impl From<&ForecastSummary> for SummaryDto {
    fn from(summary: &ForecastSummary) -> Self {
        Self {
            latest_close: round2(summary.latest_close),
            final_predicted_close: round2(summary.final_predicted_close),
            total_change: round2(summary.total_change),
            total_change_percent: round2(summary.total_change_percent),
            trend: summary.trend.as_str(),
            max_predicted_high: round2(summary.max_predicted_high),
            min_predicted_low: round2(summary.min_predicted_low),
            avg_predicted_close: round2(summary.avg_predicted_close),
            max_predicted_close: round2(summary.max_predicted_close),
            min_predicted_close: round2(summary.min_predicted_close),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastBody {
    pub horizon: usize,
    pub latest_date: TradingDate,
    pub forecast: Vec<ForecastPointDto>,
    pub summary: SummaryDto,
    pub confidence_multiplier: f64,
    /// Percent.
    pub daily_volatility: f64,
}

impl From<&Forecast> for ForecastBody {
    fn from(forecast: &Forecast) -> Self {
        Self {
            horizon: forecast.horizon,
            latest_date: forecast.latest_date,
            forecast: forecast.points.iter().map(ForecastPointDto::from).collect(),
            summary: SummaryDto::from(&forecast.summary),
            confidence_multiplier: forecast.confidence_multiplier,
            daily_volatility: round2(forecast.daily_volatility * 100.0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub success: bool,
    pub ticker: String,
    #[serde(flatten)]
    pub body: ForecastBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionDto {
    pub prediction_date: TradingDate,
    pub predicted_close: f64,
    pub close_lower: f64,
    pub close_upper: f64,
    pub latest_date: TradingDate,
    pub latest_close: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl From<&NextDayPrediction> for PredictionDto {
    fn from(prediction: &NextDayPrediction) -> Self {
        Self {
            prediction_date: prediction.prediction_date,
            predicted_close: round2(prediction.predicted_close),
            close_lower: round2(prediction.close_lower),
            close_upper: round2(prediction.close_upper),
            latest_date: prediction.latest_date,
            latest_close: round2(prediction.latest_close),
            change: round2(prediction.change),
            change_percent: round2(prediction.change_percent),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub ticker: String,
    pub prediction: PredictionDto,
}

#[derive(Debug, Serialize)]
pub struct MetricsDto {
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
    pub naive_rmse: f64,
    pub skill_score: Option<f64>,
    pub directional_accuracy: f64,
    pub residual_std: f64,
}

impl From<&ModelMetrics> for MetricsDto {
    fn from(metrics: &ModelMetrics) -> Self {
        Self {
            rmse: round2(metrics.rmse),
            mae: round2(metrics.mae),
            mape: round2(metrics.mape),
            naive_rmse: round2(metrics.naive_rmse),
            skill_score: metrics.skill_score.map(round2),
            directional_accuracy: round2(metrics.directional_accuracy),
            residual_std: round2(metrics.residual_std),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelPerformance {
    pub test_samples: usize,
    pub metrics: MetricsDto,
    pub interpretation: MetricsInterpretation,
}

impl From<EvaluationReport> for ModelPerformance {
    fn from(report: EvaluationReport) -> Self {
        Self {
            test_samples: report.test_samples,
            metrics: MetricsDto::from(&report.metrics),
            interpretation: report.interpretation,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub success: bool,
    pub ticker: String,
    #[serde(flatten)]
    pub performance: ModelPerformance,
}

impl MetricsResponse {
    pub fn new(ticker: String, report: EvaluationReport) -> Self {
        Self {
            success: true,
            ticker,
            performance: ModelPerformance::from(report),
        }
    }
}

/// Price profile of a ticker over the trailing year of history.
#[derive(Debug, Clone, Serialize)]
pub struct StockInfo {
    pub ticker: String,
    pub first_date: TradingDate,
    pub last_date: TradingDate,
    pub sessions: usize,
    pub current_price: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub avg_volume: u64,
    pub period_change_percent: f64,
}

impl StockInfo {
    /// `None` for an empty series.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let bars = series.bars();
        let first = bars.first()?;
        let last = bars.last()?;
        let high = bars.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        let low = bars.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        let total_volume: u128 = bars.iter().map(|bar| u128::from(bar.volume)).sum();
        let avg_volume = u64::try_from(total_volume / bars.len() as u128).unwrap_or(u64::MAX);
        let period_change_percent = if first.close > 0.0 {
            (last.close - first.close) / first.close * 100.0
        } else {
            0.0
        };

        Some(Self {
            ticker: series.symbol().to_string(),
            first_date: first.date,
            last_date: last.date,
            sessions: bars.len(),
            current_price: round2(last.close),
            fifty_two_week_high: round2(high),
            fifty_two_week_low: round2(low),
            avg_volume,
            period_change_percent: round2(period_change_percent),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StockInfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub info: StockInfo,
}

#[derive(Debug, Serialize)]
pub struct TechnicalAnalysis {
    pub trend: TrendSignal,
    pub rsi: RsiReading,
    pub support_resistance: SupportResistance,
}

#[derive(Debug, Serialize)]
pub struct RiskAnalysis {
    pub volatility: VolatilityMetrics,
    pub returns: ReturnsStatistics,
}

/// Indicator, model and forecast sections for one ticker. Model sections
/// are `null` when they failed; `warnings` says why.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub ticker: String,
    pub stock_info: StockInfo,
    pub technical_analysis: TechnicalAnalysis,
    pub risk_analysis: RiskAnalysis,
    pub model_performance: Option<ModelPerformance>,
    pub forecast: Option<ForecastBody>,
    pub warnings: Vec<String>,
    pub disclaimer: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuickForecastResponse {
    pub success: bool,
    pub ticker: String,
    pub current_price: f64,
    pub predicted_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: &'static str,
    pub horizon: usize,
}

impl QuickForecastResponse {
    pub fn new(forecast: &Forecast) -> Self {
        let summary = &forecast.summary;
        Self {
            success: true,
            ticker: forecast.symbol.to_string(),
            current_price: round2(summary.latest_close),
            predicted_close: round2(summary.final_predicted_close),
            change: round2(summary.total_change),
            change_percent: round2(summary.total_change_percent),
            trend: summary.trend.as_str(),
            horizon: forecast.horizon,
        }
    }
}

/// Whether a ticker is well formed and has recent prices. Always `200`.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub ticker: String,
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MarketStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: MarketStatus,
}

/// Everything the dashboard page needs in one payload. Optional sections
/// are `null` when their computation failed; `warnings` says why.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub ticker: String,
    pub latest: Option<LatestPrice>,
    pub chart_data: Option<ChartPayload>,
    pub indicators: Option<IndicatorBundle>,
    pub prediction: Option<PredictionDto>,
    pub forecast: Option<ForecastBody>,
    pub warnings: Vec<String>,
    pub disclaimer: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CompareEntry {
    pub ticker: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<LatestPrice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub success: bool,
    pub horizon: usize,
    pub results: Vec<CompareEntry>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub success: bool,
    pub model: stockcast_ml::ModelInfo,
    pub confidence_multiplier: f64,
    pub max_horizon: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub provider: &'static str,
    pub version: &'static str,
}
