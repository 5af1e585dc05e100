use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDate, ValidationError};

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Ordered daily bars for one symbol. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: Symbol,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, bars: Vec<PriceBar>) -> Result<Self, ValidationError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::UnorderedBars {
                    previous: pair[0].date.format_iso(),
                    next: pair[1].date.format_iso(),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Builds a series from provider rows that may arrive unsorted or with a
    /// repeated trailing bar; the last row seen for a date wins.
    pub fn from_unordered(symbol: Symbol, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol,
            bars: deduped,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    pub fn last_date(&self) -> Option<TradingDate> {
        self.bars.last().map(|bar| bar.date)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinitePrice { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativePrice { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u8) -> TradingDate {
        TradingDate::from_ymd(2024, 1, d).expect("valid date")
    }

    fn bar(d: u8, close: f64) -> PriceBar {
        PriceBar::new(day(d), close, close + 1.0, close - 1.0, close, 1_000).expect("valid bar")
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let err = PriceBar::new(day(2), 10.0, 12.0, 9.0, 12.5, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_inverted_range_and_non_finite_prices() {
        let err = PriceBar::new(day(2), 10.0, 9.0, 11.0, 10.0, 10).expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidBarRange);

        let err = PriceBar::new(day(2), f64::NAN, 12.0, 9.0, 10.0, 10).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFinitePrice { field: "open" });
    }

    #[test]
    fn rejects_duplicate_dates() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = PriceSeries::new(symbol, vec![bar(2, 10.0), bar(2, 11.0)]).expect_err("dup");
        assert!(matches!(err, ValidationError::UnorderedBars { .. }));
    }

    #[test]
    fn from_unordered_sorts_and_keeps_last_duplicate() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series =
            PriceSeries::from_unordered(symbol, vec![bar(3, 12.0), bar(2, 10.0), bar(3, 13.0)]);
        assert_eq!(series.closes(), vec![10.0, 13.0]);
    }

    #[test]
    fn accessors_read_the_final_bar() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series =
            PriceSeries::new(symbol, vec![bar(2, 10.0), bar(3, 11.0), bar(4, 12.0)]).expect("ok");
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), Some(12.0));
        assert_eq!(series.last_date(), Some(day(4)));
    }
}
