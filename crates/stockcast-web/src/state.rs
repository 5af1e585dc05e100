use std::sync::Arc;

use stockcast_core::{
    CachedProvider, HistoryRequest, PriceHistoryProvider, PriceSeries, ReqwestHttpClient,
    SeriesCache, SourceError, Symbol, Throttle, YahooProvider,
};
use stockcast_ml::{ForecastError, Forecaster, LstmPredictor, Predictor};
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::ApiError;

/// Shared, read-only handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    provider: CachedProvider,
    forecaster: Forecaster,
    config: ServiceConfig,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn PriceHistoryProvider>,
        predictor: Arc<dyn Predictor>,
        config: ServiceConfig,
    ) -> Self {
        let cache = if config.cache_ttl_secs == 0 {
            SeriesCache::disabled()
        } else {
            SeriesCache::new(config.cache_ttl())
        };
        Self {
            inner: Arc::new(StateInner {
                provider: CachedProvider::new(provider, cache),
                forecaster: Forecaster::new(predictor, config.forecast_config()),
                config,
            }),
        }
    }

    /// Loads the model and builds the provider described by `config`.
    /// Fails when the artifact cannot be loaded, so the listener never binds
    /// without a model.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ApiError> {
        let predictor = load_predictor(&config)?;
        let provider = provider_from_config(&config);
        Ok(Self::new(provider, predictor, config))
    }

    pub fn forecaster(&self) -> &Forecaster {
        &self.inner.forecaster
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn provider_id(&self) -> &'static str {
        self.inner.provider.id()
    }

    pub async fn history(
        &self,
        symbol: Symbol,
        lookback_days: u32,
    ) -> Result<Arc<PriceSeries>, SourceError> {
        let request = HistoryRequest::new(symbol, lookback_days)?;
        self.inner.provider.fetch(request).await
    }
}

/// Offline synthetic provider or throttled live Yahoo, per `config.offline`.
pub fn provider_from_config(config: &ServiceConfig) -> Arc<dyn PriceHistoryProvider> {
    let provider: Arc<dyn PriceHistoryProvider> = if config.offline {
        Arc::new(YahooProvider::offline())
    } else {
        Arc::new(YahooProvider::live(
            Arc::new(ReqwestHttpClient::new()),
            config.timeout_ms,
            Throttle::per_minute(config.provider_rate),
        ))
    };
    info!(
        provider = provider.id(),
        cache_ttl_secs = config.cache_ttl_secs,
        "provider ready"
    );
    provider
}

pub fn load_predictor(config: &ServiceConfig) -> Result<Arc<dyn Predictor>, ForecastError> {
    let predictor = LstmPredictor::load_expecting(&config.model_path, config.context_length)?;
    Ok(Arc::new(predictor))
}
