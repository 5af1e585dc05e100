//! Technical indicators over daily closes.
//!
//! Rolling series are aligned with their input: position `i` describes the
//! bar at `i`, and is `None` until the window has filled. Summary helpers
//! return values in percent where noted, matching what the dashboard shows.

use serde::{Deserialize, Serialize};
use stockcast_core::{PriceSeries, TradingDate};
use ta::indicators::{BollingerBands, SimpleMovingAverage};
use ta::Next;

use crate::preprocessing::{mean, pct_returns, sample_std};
use crate::IndicatorError;

pub const MA_SHORT: usize = 20;
pub const MA_LONG: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;
pub const VOLATILITY_WINDOW: usize = 20;
pub const SUPPORT_LOOKBACK: usize = 20;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Bars required before a full [`IndicatorBundle`] is computed.
pub const MIN_INDICATOR_BARS: usize = VOLATILITY_WINDOW + 1;

pub fn moving_average(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    let mut sma = SimpleMovingAverage::new(period).map_err(|e| {
        IndicatorError::InvalidParameter(format!("moving average period {period}: {e:?}"))
    })?;

    Ok(closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            let value = sma.next(*close);
            (index + 1 >= period).then_some(value)
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn bollinger_bands(
    closes: &[f64],
    period: usize,
    k: f64,
) -> Result<Vec<Option<BollingerPoint>>, IndicatorError> {
    let mut bands = BollingerBands::new(period, k).map_err(|e| {
        IndicatorError::InvalidParameter(format!("bollinger period {period} k {k}: {e:?}"))
    })?;

    Ok(closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            let out = bands.next(*close);
            (index + 1 >= period).then_some(BollingerPoint {
                upper: out.upper,
                middle: out.average,
                lower: out.lower,
            })
        })
        .collect())
}

/// Wilder-smoothed RSI. The first `period` positions are `None`.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(String::from(
            "rsi period must be positive",
        )));
    }

    let mut output = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(output);
    }

    let deltas: Vec<f64> = closes.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let n = period as f64;
    let mut avg_gain = deltas[..period].iter().map(|d| d.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = deltas[..period].iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;
    output[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for (offset, delta) in deltas[period..].iter().enumerate() {
        avg_gain = (avg_gain * (n - 1.0) + delta.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-delta).max(0.0)) / n;
        output[period + offset + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(output)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiSignal {
    pub fn classify(value: f64) -> Self {
        if value > 70.0 {
            Self::Overbought
        } else if value < 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: Option<f64>,
    pub signal: Option<RsiSignal>,
}

/// Rolling sample standard deviation of `returns`.
pub fn rolling_volatility(returns: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..returns.len())
        .map(|index| {
            (window > 1 && index + 1 >= window)
                .then(|| sample_std(&returns[index + 1 - window..=index]))
        })
        .collect()
}

pub fn annualized_volatility(returns: &[f64]) -> f64 {
    sample_std(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Deepest peak-to-trough decline as a non-positive fraction.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for close in closes {
        peak = peak.max(*close);
        if peak > 0.0 {
            worst = worst.min((close - peak) / peak);
        }
    }
    worst
}

/// Historical VaR: the `(1 - confidence)` percentile of returns, linearly
/// interpolated between order statistics.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    percentile(returns, (1.0 - confidence) * 100.0)
}

fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub pivot: f64,
    pub resistance_1: f64,
    pub resistance_2: f64,
    pub support_1: f64,
    pub support_2: f64,
    pub recent_high: f64,
    pub recent_low: f64,
    pub lookback_days: usize,
}

/// Classic floor-trader pivots from the trailing `lookback` bars.
pub fn support_resistance(
    series: &PriceSeries,
    lookback: usize,
) -> Result<SupportResistance, IndicatorError> {
    let Some(close) = series.last_close() else {
        return Err(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        });
    };
    if lookback == 0 {
        return Err(IndicatorError::InvalidParameter(String::from(
            "support/resistance lookback must be positive",
        )));
    }

    let start = series.len().saturating_sub(lookback);
    let recent = &series.bars()[start..];
    let high = recent.iter().map(|bar| bar.high).fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().map(|bar| bar.low).fold(f64::INFINITY, f64::min);

    let pivot = (high + low + close) / 3.0;
    Ok(SupportResistance {
        pivot,
        resistance_1: 2.0 * pivot - low,
        resistance_2: pivot + (high - low),
        support_1: 2.0 * pivot - high,
        support_2: pivot - (high - low),
        recent_high: high,
        recent_low: low,
        lookback_days: lookback,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    #[serde(rename = "Golden Cross (Bullish)")]
    GoldenCross,
    #[serde(rename = "Death Cross (Bearish)")]
    DeathCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricePosition {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub signal: TrendDirection,
    /// 0..=100, ten times the percent gap between the averages.
    pub strength: f64,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub crossover: Option<Crossover>,
    pub price_vs_ma20: Option<PricePosition>,
    pub price_vs_ma50: Option<PricePosition>,
}

/// MA20/MA50 crossover signal; crossovers compare against the bar four
/// sessions earlier.
pub fn trend_signal(series: &PriceSeries) -> Result<TrendSignal, IndicatorError> {
    let closes = series.closes();
    let Some(&close) = closes.last() else {
        return Err(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        });
    };

    let ma20 = moving_average(&closes, MA_SHORT)?;
    let ma50 = moving_average(&closes, MA_LONG)?;
    let last = closes.len() - 1;
    let (short, long) = (ma20[last], ma50[last]);

    let (signal, strength) = match (short, long) {
        (Some(s), Some(l)) if l != 0.0 && s > l => {
            (TrendDirection::Bullish, ((s - l) / l * 100.0 * 10.0).min(100.0))
        }
        (Some(s), Some(l)) if l != 0.0 => {
            (TrendDirection::Bearish, ((l - s) / l * 100.0 * 10.0).min(100.0))
        }
        _ => (TrendDirection::Neutral, 0.0),
    };

    let crossover = if closes.len() >= 5 {
        let previous = if closes.len() > 5 { closes.len() - 5 } else { 0 };
        match (ma20[previous], ma50[previous], short, long) {
            (Some(ps), Some(pl), Some(s), Some(l)) if ps < pl && s > l => {
                Some(Crossover::GoldenCross)
            }
            (Some(ps), Some(pl), Some(s), Some(l)) if ps > pl && s < l => {
                Some(Crossover::DeathCross)
            }
            _ => None,
        }
    } else {
        None
    };

    let position = |average: Option<f64>| {
        average.map(|a| {
            if close > a {
                PricePosition::Above
            } else {
                PricePosition::Below
            }
        })
    };

    Ok(TrendSignal {
        signal,
        strength,
        ma20: short,
        ma50: long,
        crossover,
        price_vs_ma20: position(short),
        price_vs_ma50: position(long),
    })
}

/// Volatility summary, every figure in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    pub daily_volatility: f64,
    pub annual_volatility: f64,
    pub volatility_20d: Option<f64>,
    pub volatility_60d: Option<f64>,
    pub var_95: f64,
    pub max_drawdown: f64,
    pub interpretation: String,
}

pub fn volatility_metrics(series: &PriceSeries) -> Result<VolatilityMetrics, IndicatorError> {
    require_bars(series, MIN_INDICATOR_BARS)?;
    let closes = series.closes();
    let returns = pct_returns(&closes);

    let daily = sample_std(&returns);
    let annual = daily * TRADING_DAYS_PER_YEAR.sqrt();
    let trailing = |window: usize| {
        (returns.len() >= window)
            .then(|| annualized_volatility(&returns[returns.len() - window..]) * 100.0)
    };

    Ok(VolatilityMetrics {
        daily_volatility: daily * 100.0,
        annual_volatility: annual * 100.0,
        volatility_20d: trailing(20),
        volatility_60d: trailing(60),
        var_95: value_at_risk(&returns, 0.95).unwrap_or(0.0) * 100.0,
        max_drawdown: max_drawdown(&closes) * 100.0,
        interpretation: interpret_volatility(annual * 100.0).to_owned(),
    })
}

pub fn interpret_volatility(annual_pct: f64) -> &'static str {
    if annual_pct < 15.0 {
        "Low volatility - Relatively stable"
    } else if annual_pct < 25.0 {
        "Moderate volatility - Normal market conditions"
    } else if annual_pct < 40.0 {
        "High volatility - Increased uncertainty"
    } else {
        "Very high volatility - Extreme market conditions"
    }
}

/// Distribution of simple daily returns; rates are in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsStatistics {
    pub mean_daily_return: f64,
    pub median_daily_return: f64,
    pub std_daily_return: f64,
    pub annualized_return: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub positive_days: usize,
    pub negative_days: usize,
    pub positive_ratio: f64,
    pub best_day: f64,
    pub worst_day: f64,
    pub total_days: usize,
}

pub fn returns_statistics(series: &PriceSeries) -> Result<ReturnsStatistics, IndicatorError> {
    require_bars(series, 3)?;
    let returns = pct_returns(&series.closes());
    let total = returns.len();
    let positive = returns.iter().filter(|r| **r > 0.0).count();
    let negative = returns.iter().filter(|r| **r < 0.0).count();
    let avg = mean(&returns);

    Ok(ReturnsStatistics {
        mean_daily_return: avg * 100.0,
        median_daily_return: median(&returns) * 100.0,
        std_daily_return: sample_std(&returns) * 100.0,
        annualized_return: avg * TRADING_DAYS_PER_YEAR * 100.0,
        skewness: skewness(&returns),
        kurtosis: excess_kurtosis(&returns),
        positive_days: positive,
        negative_days: negative,
        positive_ratio: positive as f64 / total as f64 * 100.0,
        best_day: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max) * 100.0,
        worst_day: returns.iter().copied().fold(f64::INFINITY, f64::min) * 100.0,
        total_days: total,
    })
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Bias-adjusted sample skewness (G1).
fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Bias-adjusted excess kurtosis (G2).
fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 == 0.0 {
        return 0.0;
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// All summaries shown on the dashboard for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub trend: TrendSignal,
    pub volatility: VolatilityMetrics,
    pub returns: ReturnsStatistics,
    pub support_resistance: SupportResistance,
    pub rsi: RsiReading,
}

impl IndicatorBundle {
    pub fn compute(series: &PriceSeries) -> Result<Self, IndicatorError> {
        require_bars(series, MIN_INDICATOR_BARS)?;
        let closes = series.closes();
        let latest_rsi = rsi(&closes, RSI_PERIOD)?.last().copied().flatten();

        Ok(Self {
            trend: trend_signal(series)?,
            volatility: volatility_metrics(series)?,
            returns: returns_statistics(series)?,
            support_resistance: support_resistance(series, SUPPORT_LOOKBACK)?,
            rsi: RsiReading {
                value: latest_rsi,
                signal: latest_rsi.map(RsiSignal::classify),
            },
        })
    }
}

/// Per-bar arrays for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub dates: Vec<TradingDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    /// Rolling 20-day volatility of daily returns, percent.
    pub volatility: Vec<Option<f64>>,
    /// Daily return, percent.
    pub returns: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

/// Indicators are computed on the whole series, then the trailing `days`
/// points are kept so early windows are already warm.
pub fn chart_data(series: &PriceSeries, days: Option<usize>) -> Result<ChartData, IndicatorError> {
    let closes = series.closes();
    let returns = pct_returns(&closes);

    let ma20 = moving_average(&closes, MA_SHORT)?;
    let ma50 = moving_average(&closes, MA_LONG)?;
    let bands = bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_K)?;
    let rsi_values = rsi(&closes, RSI_PERIOD)?;

    // Returns start at the second bar; shift them onto bar positions.
    let aligned_returns: Vec<Option<f64>> = std::iter::once(None)
        .chain(returns.iter().map(|r| Some(r * 100.0)))
        .take(closes.len())
        .collect();
    let aligned_volatility: Vec<Option<f64>> = std::iter::once(None)
        .chain(
            rolling_volatility(&returns, VOLATILITY_WINDOW)
                .into_iter()
                .map(|v| v.map(|v| v * 100.0)),
        )
        .take(closes.len())
        .collect();

    let start = days.map_or(0, |d| closes.len().saturating_sub(d));
    let bars = &series.bars()[start..];

    Ok(ChartData {
        dates: bars.iter().map(|bar| bar.date).collect(),
        open: bars.iter().map(|bar| bar.open).collect(),
        high: bars.iter().map(|bar| bar.high).collect(),
        low: bars.iter().map(|bar| bar.low).collect(),
        close: bars.iter().map(|bar| bar.close).collect(),
        volume: bars.iter().map(|bar| bar.volume).collect(),
        ma20: ma20[start..].to_vec(),
        ma50: ma50[start..].to_vec(),
        bb_upper: bands[start..].iter().map(|b| b.map(|b| b.upper)).collect(),
        bb_middle: bands[start..].iter().map(|b| b.map(|b| b.middle)).collect(),
        bb_lower: bands[start..].iter().map(|b| b.map(|b| b.lower)).collect(),
        volatility: aligned_volatility[start..].to_vec(),
        returns: aligned_returns[start..].to_vec(),
        rsi: rsi_values[start..].to_vec(),
    })
}

fn require_bars(series: &PriceSeries, required: usize) -> Result<(), IndicatorError> {
    if series.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: series.len(),
        });
    }
    Ok(())
}
