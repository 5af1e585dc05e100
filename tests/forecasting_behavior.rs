//! Behavior tests for the recursive forecaster.
//!
//! These exercise the forecaster the way the API does: a validated price
//! series in, a full multi-day forecast with bands out.

use stockcast_ml::ForecastConfig;
use stockcast_tests::*;

fn forecaster(context_length: usize, step: f64) -> Forecaster {
    Forecaster::new(
        Arc::new(StepPredictor::new(context_length, step)),
        ForecastConfig::default(),
    )
}

// =============================================================================
// Forecast shape
// =============================================================================

#[test]
fn when_horizon_is_valid_forecast_has_exactly_that_many_contiguous_days() {
    // Given: Sixty bars and a 30-step predictor
    let history = series_from_closes("AAPL", &wavy_closes(60));

    // When: A ten-day forecast is requested
    let forecast = forecaster(30, 0.01)
        .forecast(&history, 10)
        .expect("forecast should succeed");

    // Then: Days run 1..=10 on strictly increasing weekdays after the last bar
    assert_eq!(forecast.points.len(), 10);
    let mut previous = history.last_date().expect("non-empty");
    for (index, point) in forecast.points.iter().enumerate() {
        assert_eq!(point.day, index + 1);
        assert!(point.date > previous, "dates must increase");
        assert!(!point.date.is_weekend(), "forecast dates skip weekends");
        previous = point.date;
    }
}

#[test]
fn when_forecasting_bands_contain_close_and_widen_each_day() {
    // Given: A forecaster over a non-flat history
    let history = series_from_closes("MSFT", &wavy_closes(80));

    // When: A thirty-day forecast is produced
    let forecast = forecaster(30, -0.02)
        .forecast(&history, 30)
        .expect("forecast should succeed");

    // Then: Every band contains its close and widths never shrink
    let mut last_width = 0.0;
    for point in &forecast.points {
        assert!(point.close_lower <= point.close && point.close <= point.close_upper);
        assert!(point.low <= point.open.min(point.close));
        assert!(point.high >= point.open.max(point.close));
        let width = point.close_upper - point.close_lower;
        assert!(width >= last_width, "band width must be non-decreasing");
        last_width = width;
    }
}

#[test]
fn when_first_day_opens_it_opens_at_the_last_actual_close() {
    let history = series_from_closes("NVDA", &wavy_closes(50));
    let forecast = forecaster(30, 0.0).forecast(&history, 3).expect("forecast");

    let latest_close = history.last_close().expect("non-empty");
    assert_eq!(forecast.points[0].open, latest_close);
    assert_eq!(forecast.points[1].open, forecast.points[0].close);
}

#[test]
fn same_inputs_produce_identical_forecasts() {
    let history = series_from_closes("TSLA", &wavy_closes(64));
    let forecaster = forecaster(30, 0.015);

    let first = forecaster.forecast(&history, 12).expect("first");
    let second = forecaster.forecast(&history, 12).expect("second");

    assert_eq!(first, second);
}

// =============================================================================
// Summary and trend
// =============================================================================

#[test]
fn when_final_close_is_above_latest_trend_is_bullish() {
    let history = series_from_closes("AMZN", &wavy_closes(60));

    let rising = forecaster(30, 0.05).forecast(&history, 5).expect("rising");
    let falling = forecaster(30, -0.05).forecast(&history, 5).expect("falling");

    assert_eq!(rising.summary.trend.as_str(), "Bullish");
    assert!(rising.summary.total_change > 0.0);
    assert_eq!(falling.summary.trend.as_str(), "Bearish");
    assert!(falling.summary.total_change < 0.0);
}

#[test]
fn summary_aggregates_match_the_points() {
    let history = series_from_closes("META", &wavy_closes(60));
    let forecast = forecaster(30, 0.01).forecast(&history, 6).expect("forecast");
    let summary = &forecast.summary;

    let closes: Vec<f64> = forecast.points.iter().map(|p| p.close).collect();
    let max_high = forecast.points.iter().map(|p| p.high).fold(f64::MIN, f64::max);
    let min_low = forecast.points.iter().map(|p| p.low).fold(f64::MAX, f64::min);

    assert_eq!(summary.final_predicted_close, closes[5]);
    assert_eq!(summary.max_predicted_high, max_high);
    assert_eq!(summary.min_predicted_low, min_low);
    assert!((summary.avg_predicted_close - closes.iter().sum::<f64>() / 6.0).abs() < 1e-9);
}

#[test]
fn next_day_prediction_equals_first_forecast_day() {
    let history = series_from_closes("GOOGL", &wavy_closes(60));
    let forecaster = forecaster(30, 0.02);

    let prediction = forecaster.predict_next_day(&history).expect("prediction");
    let forecast = forecaster.forecast(&history, 1).expect("forecast");

    assert_eq!(prediction.predicted_close, forecast.points[0].close);
    assert_eq!(prediction.prediction_date, forecast.points[0].date);
    assert_eq!(prediction.latest_close, history.last_close().expect("close"));
}

// =============================================================================
// Error handling
// =============================================================================

#[test]
fn when_history_is_shorter_than_context_forecast_fails() {
    // Given: Twenty bars for a 30-step model
    let history = series_from_closes("AAPL", &wavy_closes(20));

    // When / Then: The forecast reports how many bars were needed
    let err = forecaster(30, 0.01)
        .forecast(&history, 5)
        .expect_err("short history must fail");
    assert_eq!(
        err,
        ForecastError::InsufficientHistory {
            required: 31,
            available: 20
        }
    );
}

#[test]
fn when_horizon_is_out_of_range_forecast_fails() {
    let history = series_from_closes("AAPL", &wavy_closes(60));
    let forecaster = forecaster(30, 0.01);

    for (horizon, reported) in [(0, 0), (31, 31)] {
        let err = forecaster.forecast(&history, horizon).expect_err("bad horizon");
        assert_eq!(err, ForecastError::InvalidHorizon { horizon: reported, max: 30 });
    }
}

#[test]
fn when_trailing_window_is_flat_forecast_fails() {
    let mut closes = wavy_closes(20);
    closes.extend(std::iter::repeat(150.0).take(40));
    let history = series_from_closes("KO", &closes);

    let err = forecaster(30, 0.01).forecast(&history, 5).expect_err("flat");
    assert!(matches!(err, ForecastError::FlatSeries { .. }));
}

// =============================================================================
// Loaded artifact
// =============================================================================

#[test]
fn forecaster_runs_a_model_loaded_from_disk() {
    // Given: A constant-output artifact on disk
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_artifact(&dir, &constant_artifact(30, 0.5));
    let predictor = stockcast_ml::LstmPredictor::load_expecting(&path, 30).expect("load");

    // When: It drives a forecast
    let history = series_from_closes("PEP", &wavy_closes(60));
    let forecast = Forecaster::new(Arc::new(predictor), ForecastConfig::default())
        .forecast(&history, 4)
        .expect("forecast");

    // Then: Every close is the midpoint of the trailing window's range
    let closes = history.closes();
    let window = &closes[closes.len() - 30..];
    let min = window.iter().copied().fold(f64::MAX, f64::min);
    let max = window.iter().copied().fold(f64::MIN, f64::max);
    for point in &forecast.points {
        assert!((point.close - (min + max) / 2.0).abs() < 1e-9);
    }
}
