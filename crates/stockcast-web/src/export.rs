//! CSV attachments: the bare forecast table and the full analysis report.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use stockcast_core::Symbol;
use stockcast_ml::{Forecast, IndicatorBundle};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::dto::{round2, LatestPrice, DISCLAIMER};
use crate::error::ApiError;

const FORECAST_HEADER: [&str; 8] = [
    "Day",
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Lower_95CI",
    "Upper_95CI",
];

type CsvWriter = csv::Writer<Vec<u8>>;

fn writer() -> CsvWriter {
    csv::WriterBuilder::new().flexible(true).from_writer(Vec::new())
}

fn finish(writer: CsvWriter) -> Result<Vec<u8>, ApiError> {
    writer
        .into_inner()
        .map_err(|e| ApiError::Export(e.to_string()))
}

fn export_err(error: csv::Error) -> ApiError {
    ApiError::Export(error.to_string())
}

fn row(out: &mut CsvWriter, fields: &[&str]) -> Result<(), ApiError> {
    out.write_record(fields).map_err(export_err)
}

fn cents(value: f64) -> String {
    format!("{:.2}", round2(value))
}

fn write_points(out: &mut CsvWriter, forecast: &Forecast) -> Result<(), ApiError> {
    for point in &forecast.points {
        out.write_record([
            point.day.to_string(),
            point.date.format_iso(),
            cents(point.open),
            cents(point.high),
            cents(point.low),
            cents(point.close),
            cents(point.close_lower),
            cents(point.close_upper),
        ])
        .map_err(export_err)?;
    }
    Ok(())
}

/// One row per forecast day.
pub fn forecast_csv(forecast: &Forecast) -> Result<Vec<u8>, ApiError> {
    let mut out = writer();
    out.write_record(FORECAST_HEADER).map_err(export_err)?;
    write_points(&mut out, forecast)?;
    finish(out)
}

/// Sectioned report: latest bar, forecast table, summary, indicators and the
/// disclaimer. Sections are separated by blank rows.
pub fn report_csv(
    latest: Option<&LatestPrice>,
    forecast: &Forecast,
    indicators: Option<&IndicatorBundle>,
    generated_at: OffsetDateTime,
) -> Result<Vec<u8>, ApiError> {
    let stamp = generated_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .map_err(|e| ApiError::Export(e.to_string()))?;

    let mut out = writer();

    row(&mut out, &["Stock Forecast Analysis Report"])?;
    row(&mut out, &["Generated", &stamp])?;
    row(&mut out, &["Ticker", forecast.symbol.as_str()])?;
    row(&mut out, &[])?;

    row(&mut out, &["=== CURRENT PRICE ==="])?;
    if let Some(latest) = latest {
        row(&mut out, &["Date", &latest.date.format_iso()])?;
        row(&mut out, &["Current Price", &cents(latest.current_price)])?;
        row(&mut out, &["Open", &cents(latest.open)])?;
        row(&mut out, &["High", &cents(latest.high)])?;
        row(&mut out, &["Low", &cents(latest.low)])?;
        row(&mut out, &["Change", &cents(latest.change)])?;
        row(&mut out, &["Change %", &cents(latest.change_percent)])?;
        row(&mut out, &["Volume", &latest.volume.to_string()])?;
    } else {
        row(&mut out, &["Unavailable"])?;
    }
    row(&mut out, &[])?;

    row(&mut out, &["=== FORECAST ==="])?;
    row(&mut out, &[
        "Day",
        "Date",
        "Open",
        "High",
        "Low",
        "Close",
        "Lower Band",
        "Upper Band",
    ])?;
    write_points(&mut out, forecast)?;
    row(&mut out, &[])?;

    let summary = &forecast.summary;
    row(&mut out, &["=== FORECAST SUMMARY ==="])?;
    row(&mut out, &["Latest Close", &cents(summary.latest_close)])?;
    row(&mut out, &["Final Predicted Close", &cents(summary.final_predicted_close)])?;
    row(&mut out, &["Total Change", &cents(summary.total_change)])?;
    row(&mut out, &["Total Change %", &cents(summary.total_change_percent)])?;
    row(&mut out, &["Trend", summary.trend.as_str()])?;
    row(&mut out, &["Max Predicted High", &cents(summary.max_predicted_high)])?;
    row(&mut out, &["Min Predicted Low", &cents(summary.min_predicted_low)])?;
    row(&mut out, &[])?;

    row(&mut out, &["=== TECHNICAL INDICATORS ==="])?;
    match indicators {
        Some(bundle) => {
            let rsi = bundle.rsi.value.map_or_else(|| String::from("n/a"), cents);
            row(&mut out, &["RSI (14)", &rsi])?;
            row(&mut out, &["Trend Signal", &format!("{:?}", bundle.trend.signal)])?;
            row(&mut out, &["Trend Strength", &cents(bundle.trend.strength)])?;
            row(&mut out, &[
                "Annual Volatility %",
                &cents(bundle.volatility.annual_volatility),
            ])?;
            row(&mut out, &["Max Drawdown %", &cents(bundle.volatility.max_drawdown)])?;
            row(&mut out, &["Volatility", &bundle.volatility.interpretation])?;
            row(&mut out, &["Pivot", &cents(bundle.support_resistance.pivot)])?;
            row(&mut out, &["Support 1", &cents(bundle.support_resistance.support_1)])?;
            row(&mut out, &["Resistance 1", &cents(bundle.support_resistance.resistance_1)])?;
        }
        None => row(&mut out, &["Unavailable"])?,
    }
    row(&mut out, &[])?;

    row(&mut out, &["=== DISCLAIMER ==="])?;
    row(&mut out, &[DISCLAIMER])?;

    finish(out)
}

/// Wraps CSV bytes as a file download.
pub fn attachment(filename: String, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, String::from("text/csv; charset=utf-8")),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub fn filename(symbol: &Symbol, kind: &str, generated_at: OffsetDateTime) -> String {
    format!(
        "{}_{kind}_{}.csv",
        symbol.as_str(),
        generated_at.unix_timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::TradingDate;
    use stockcast_ml::{ForecastPoint, ForecastSummary, Trend};

    fn forecast() -> Forecast {
        let start = TradingDate::from_ymd(2024, 6, 7).expect("date");
        let points: Vec<ForecastPoint> = (1..=2)
            .scan(start, |date, day| {
                *date = date.next_business_day();
                let close = 100.0 + day as f64;
                Some(ForecastPoint {
                    day,
                    date: *date,
                    open: close - 1.0,
                    high: close + 1.0,
                    low: close - 2.0,
                    close,
                    close_lower: close - 3.0,
                    close_upper: close + 3.0,
                })
            })
            .collect();
        Forecast {
            symbol: Symbol::parse("NVDA").expect("symbol"),
            horizon: 2,
            latest_date: start,
            points,
            summary: ForecastSummary {
                latest_close: 100.0,
                final_predicted_close: 102.0,
                total_change: 2.0,
                total_change_percent: 2.0,
                trend: Trend::Bullish,
                max_predicted_high: 103.0,
                min_predicted_low: 99.0,
                avg_predicted_close: 101.5,
                max_predicted_close: 102.0,
                min_predicted_close: 101.0,
            },
            daily_volatility: 0.01,
            confidence_multiplier: 1.96,
        }
    }

    #[test]
    fn forecast_csv_has_header_and_one_row_per_day() {
        let bytes = forecast_csv(&forecast()).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Day,Date,Open,High,Low,Close,Lower_95CI,Upper_95CI");
        assert_eq!(lines.len(), 3);
        // 2024-06-07 is a Friday; day one lands on Monday.
        assert!(lines[1].starts_with("1,2024-06-10,100.00,"));
    }

    #[test]
    fn report_contains_every_section() {
        let generated = OffsetDateTime::from_unix_timestamp(1_718_000_000).expect("timestamp");
        let bytes = report_csv(None, &forecast(), None, generated).expect("report");
        let text = String::from_utf8(bytes).expect("utf8");

        for section in [
            "=== CURRENT PRICE ===",
            "=== FORECAST ===",
            "=== FORECAST SUMMARY ===",
            "=== TECHNICAL INDICATORS ===",
            "=== DISCLAIMER ===",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("Ticker,NVDA"));
        assert!(text.contains("Trend,Bullish"));
    }

    #[test]
    fn filename_is_symbol_kind_and_timestamp() {
        let generated = OffsetDateTime::from_unix_timestamp(1_718_000_000).expect("timestamp");
        let symbol = Symbol::parse("NVDA").expect("symbol");
        assert_eq!(
            filename(&symbol, "forecast", generated),
            "NVDA_forecast_1718000000.csv"
        );
    }
}
