//! # Stockcast Web
//!
//! JSON API over the forecasting core, plus CSV export.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `ServiceConfig` flags and environment variables |
//! | [`state`] | Shared handler state: cached provider and forecaster |
//! | [`routes`] | Request handlers |
//! | [`dto`] | Request and response bodies |
//! | [`export`] | CSV forecast and report attachments |
//! | [`error`] | `ApiError` and its HTTP mapping |

pub mod config;
pub mod dto;
pub mod error;
pub mod export;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ServiceConfig;
pub use error::{ApiError, ServeError};
pub use state::AppState;

/// All routes with tracing and permissive CORS. When a static directory is
/// configured it answers every path the API does not.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stock/:ticker", get(routes::stock_history))
        .route("/stock/:ticker/info", get(routes::stock_info))
        .route("/stock/:ticker/latest", get(routes::latest_price))
        .route("/stock/:ticker/indicators", get(routes::indicators))
        .route("/predict", post(routes::predict))
        .route("/forecast", post(routes::forecast))
        .route("/metrics/:ticker", get(routes::metrics))
        .route("/dashboard/:ticker", get(routes::dashboard))
        .route("/analysis/:ticker", get(routes::analysis))
        .route("/quick/:ticker", get(routes::quick_forecast))
        .route("/compare", post(routes::compare))
        .route("/model/info", get(routes::model_info))
        .route("/validate/:ticker", get(routes::validate_ticker))
        .route("/market/status", get(routes::market))
        .route("/search", get(routes::search))
        .route("/download/csv", post(routes::download_csv))
        .route("/download/report", post(routes::download_report));

    let static_dir = state.config().static_dir.clone();
    let mut app = Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api)
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Loads the model, binds `config.bind` and serves until the process ends.
pub async fn serve(config: ServiceConfig) -> Result<(), ServeError> {
    let bind = config.bind;
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "stockcast listening");
    axum::serve(listener, app).await?;
    Ok(())
}
