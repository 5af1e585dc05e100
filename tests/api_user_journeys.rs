//! End-to-end journeys through the HTTP router, driven in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use stockcast_tests::*;
use stockcast_web::{router, AppState, ServiceConfig};
use tower::ServiceExt;

fn offline_app(predictor: StepPredictor) -> Router {
    let end = TradingDate::from_ymd(2024, 9, 30).expect("date");
    router(AppState::new(
        Arc::new(YahooProvider::offline_until(end)),
        Arc::new(predictor),
        ServiceConfig::default(),
    ))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_owned()))
        .expect("request")
}

#[tokio::test]
async fn user_views_chart_then_forecasts_the_same_ticker() {
    // Given: The service running over offline prices
    let app = offline_app(StepPredictor::new(60, 0.01));

    // When: The user opens a 180-day chart
    let (status, chart) = call(app.clone(), get("/api/stock/aapl?days=180")).await;

    // Then: Arrays line up and the earliest moving averages are already warm
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chart["ticker"], "AAPL");
    let dates = chart["data"]["dates"].as_array().expect("dates");
    let ma50 = chart["data"]["indicators"]["ma50"].as_array().expect("ma50");
    assert_eq!(dates.len(), ma50.len());
    assert!(ma50[0].is_number(), "warm-up history precedes the window");

    // When: The user asks for the default forecast
    let (status, forecast) = call(app, post("/api/forecast", r#"{"ticker":"AAPL"}"#)).await;

    // Then: Five days are returned, starting after the last chart date
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forecast["horizon"], 5);
    let points = forecast["forecast"].as_array().expect("points");
    assert_eq!(points.len(), 5);
    let last_chart_date = dates.last().and_then(Value::as_str).expect("date");
    assert!(points[0]["date"].as_str().expect("date") > last_chart_date);
    assert_eq!(forecast["confidence_multiplier"], 1.96);
}

#[tokio::test]
async fn user_requests_too_long_a_horizon() {
    let app = offline_app(StepPredictor::new(60, 0.01));

    let (status, body) = call(app, post("/api/forecast", r#"{"ticker":"AAPL","horizon":45}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().expect("message").contains("horizon"));
}

#[tokio::test]
async fn negative_horizon_is_an_invalid_horizon_not_a_malformed_body() {
    // Given: The service running over offline prices
    let app = offline_app(StepPredictor::new(60, 0.01));

    // When: The user posts a negative horizon
    let (status, body) = call(app.clone(), post("/api/forecast", r#"{"ticker":"AAPL","horizon":-1}"#)).await;

    // Then: It is reported with the same code as any other out-of-range horizon
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "forecast.invalid_horizon");
    assert!(body["error"].as_str().expect("message").contains("-1"));

    // And: The dashboard query path agrees
    let (status, body) = call(app, get("/api/dashboard/AAPL?horizon=-3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "forecast.invalid_horizon");
}

#[tokio::test]
async fn absurd_step_count_is_rejected_before_evaluation() {
    let app = offline_app(StepPredictor::new(60, 0.01));

    let (status, body) = call(app, get("/api/metrics/MSFT?steps=18446744073709551615")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn model_with_long_context_reports_insufficient_history() {
    // Given: A model that needs more bars than a year of history holds
    let app = offline_app(StepPredictor::new(400, 0.01));

    // When / Then: Forecasting fails as unprocessable, the dashboard degrades
    let (status, body) = call(app.clone(), post("/api/predict", r#"{"ticker":"MSFT"}"#)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "forecast.insufficient_history");

    let (status, dashboard) = call(app, get("/api/dashboard/MSFT")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dashboard["forecast"].is_null());
    assert!(dashboard["prediction"].is_null());
    assert!(dashboard["chart_data"].is_object());
    assert_eq!(dashboard["warnings"].as_array().expect("warnings").len(), 1);
}

#[tokio::test]
async fn analysis_degrades_the_forecast_but_keeps_indicators() {
    // Given: A model whose context exceeds a year of sessions
    let app = offline_app(StepPredictor::new(400, 0.01));

    // When: The user opens the full analysis
    let (status, analysis) = call(app, get("/api/analysis/MSFT")).await;

    // Then: Indicator sections are present and the forecast is replaced by a warning
    assert_eq!(status, StatusCode::OK);
    assert!(analysis["technical_analysis"]["rsi"].is_object());
    assert!(analysis["risk_analysis"]["returns"]["total_days"].is_number());
    assert!(analysis["forecast"].is_null());
    let warnings = analysis["warnings"].as_array().expect("warnings");
    assert!(warnings
        .iter()
        .filter_map(Value::as_str)
        .any(|warning| warning.starts_with("forecast unavailable")));
}

#[tokio::test]
async fn quick_forecast_agrees_with_the_full_forecast() {
    let app = offline_app(StepPredictor::new(60, 0.01));

    let (status, quick) = call(app.clone(), get("/api/quick/AAPL?horizon=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quick["horizon"], 3);

    let (_, full) = call(app, post("/api/forecast", r#"{"ticker":"AAPL","horizon":3}"#)).await;
    assert_eq!(quick["predicted_close"], full["summary"]["final_predicted_close"]);
    assert_eq!(quick["current_price"], full["summary"]["latest_close"]);
    assert_eq!(quick["trend"], full["summary"]["trend"]);
}

#[tokio::test]
async fn user_downloads_the_full_report() {
    let app = offline_app(StepPredictor::new(60, -0.01));

    let response = app
        .oneshot(post("/api/download/report", r#"{"ticker":"KO","horizon":3}"#))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(content_type.as_deref(), Some("text/csv; charset=utf-8"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("Ticker,KO"));
    assert!(text.contains("=== TECHNICAL INDICATORS ==="));
    assert!(text.contains("Trend,Bearish"));
}

#[tokio::test]
async fn latest_and_indicators_endpoints_describe_the_last_session() {
    let app = offline_app(StepPredictor::new(60, 0.0));

    let (status, latest) = call(app.clone(), get("/api/stock/V/latest")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["data"]["ticker"], "V");
    assert_eq!(latest["data"]["date"], "2024-09-30");

    let (status, indicators) = call(app, get("/api/stock/V/indicators")).await;
    assert_eq!(status, StatusCode::OK);
    let rsi = indicators["indicators"]["rsi"]["value"].as_f64().expect("rsi");
    assert!((0.0..=100.0).contains(&rsi));
}

#[test]
fn service_refuses_to_start_without_a_model() {
    let config = ServiceConfig {
        model_path: "/nonexistent/model.json".into(),
        offline: true,
        ..ServiceConfig::default()
    };

    let err = AppState::from_config(config).err().expect("startup must fail");
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn service_starts_from_an_artifact_on_disk() {
    // Given: A valid artifact and an offline configuration
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_artifact(&dir, &constant_artifact(100, 0.5));
    let config = ServiceConfig {
        model_path: path,
        offline: true,
        ..ServiceConfig::default()
    };

    // When: The state is built and the health and model endpoints are hit
    let app = router(AppState::from_config(config).expect("state"));
    let (status, health) = call(app.clone(), get("/health")).await;
    let (_, info) = call(app, get("/api/model/info")).await;

    // Then: The model is reported as loaded with its shape
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model_loaded"], true);
    assert_eq!(info["model"]["name"], "constant");
    assert_eq!(info["model"]["context_length"], 100);
}
