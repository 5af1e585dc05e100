//! Short-lived in-memory cache of fetched price series.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{HistoryRequest, PriceHistoryProvider, PriceSeries, SourceError, Symbol};

type CacheKey = (Symbol, u32);

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Arc<PriceSeries>,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl CacheInner {
    fn get(&self, key: &CacheKey) -> Option<Arc<PriceSeries>> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(Arc::clone(&entry.series))
            } else {
                None
            }
        })
    }

    /// Inserts `series` and drops every expired entry, so the map never
    /// outgrows the keys requested within one TTL.
    fn put(&mut self, key: CacheKey, series: Arc<PriceSeries>) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
        self.map.insert(
            key,
            CacheEntry {
                series,
                expires_at: now + self.ttl,
            },
        );
    }
}

/// Thread-safe series cache keyed by (symbol, lookback days).
#[derive(Debug, Clone)]
pub struct SeriesCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn get(&self, request: &HistoryRequest) -> Option<Arc<PriceSeries>> {
        let store = self.inner.read().await;
        store.get(&(request.symbol.clone(), request.lookback_days))
    }

    /// No-op when the cache is disabled.
    pub async fn put(&self, request: &HistoryRequest, series: Arc<PriceSeries>) {
        let mut store = self.inner.write().await;
        if store.ttl == Duration::ZERO {
            return;
        }
        store.put((request.symbol.clone(), request.lookback_days), series);
    }

    /// Number of entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.ttl == Duration::ZERO
    }
}

/// Read-through wrapper that serves repeated lookups from a [`SeriesCache`].
pub struct CachedProvider {
    inner: Arc<dyn PriceHistoryProvider>,
    cache: SeriesCache,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn PriceHistoryProvider>, cache: SeriesCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub async fn fetch(&self, request: HistoryRequest) -> Result<Arc<PriceSeries>, SourceError> {
        if let Some(series) = self.cache.get(&request).await {
            debug!(symbol = %request.symbol, lookback = request.lookback_days, "series cache hit");
            return Ok(series);
        }

        debug!(symbol = %request.symbol, lookback = request.lookback_days, "series cache miss");
        let series = Arc::new(self.inner.history(request.clone()).await?);
        self.cache.put(&request, Arc::clone(&series)).await;
        Ok(series)
    }
}

impl PriceHistoryProvider for CachedProvider {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch(req).await.map(|series| (*series).clone()) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{PriceBar, TradingDate};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl PriceHistoryProvider for CountingProvider {
        fn id(&self) -> &'static str {
            "counting"
        }

        fn history<'a>(
            &'a self,
            req: HistoryRequest,
        ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let date = TradingDate::from_ymd(2024, 1, 2).expect("date");
                let bar = PriceBar::new(date, 10.0, 11.0, 9.0, 10.5, 100).expect("bar");
                Ok(PriceSeries::new(req.symbol, vec![bar]).expect("series"))
            })
        }
    }

    fn request(symbol: &str, days: u32) -> HistoryRequest {
        HistoryRequest::new(Symbol::parse(symbol).expect("symbol"), days).expect("request")
    }

    #[tokio::test]
    async fn serves_repeat_lookups_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedProvider::new(provider.clone(), SeriesCache::new(Duration::from_secs(60)));

        cached.fetch(request("AAPL", 365)).await.expect("first");
        cached.fetch(request("AAPL", 365)).await.expect("second");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        cached.fetch(request("MSFT", 365)).await.expect("other symbol");
        cached.fetch(request("AAPL", 30)).await.expect("other lookback");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = SeriesCache::new(Duration::from_millis(50));
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedProvider::new(provider.clone(), cache.clone());

        cached.fetch(request("AAPL", 365)).await.expect("first");
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get(&request("AAPL", 365)).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_on_the_next_insert() {
        // Given: Many distinct lookbacks cached with a short TTL
        let cache = SeriesCache::new(Duration::from_millis(250));
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedProvider::new(provider, cache.clone());
        for days in 30..230 {
            cached.fetch(request("AAPL", days)).await.expect("fetch");
        }
        assert_eq!(cache.len().await, 200);

        // When: They expire and one new key is fetched
        tokio::time::sleep(Duration::from_millis(400)).await;
        cached.fetch(request("AAPL", 400)).await.expect("new key");

        // Then: Only the fresh entry remains
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = SeriesCache::disabled();
        assert!(cache.is_disabled().await);

        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedProvider::new(provider.clone(), cache.clone());
        cached.fetch(request("AAPL", 365)).await.expect("first");
        cached.fetch(request("AAPL", 365)).await.expect("second");

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 0);
    }
}
