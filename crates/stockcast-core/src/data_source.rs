//! Price history provider contract and its error type.
//!
//! Every market-data adapter implements [`PriceHistoryProvider`]. Requests are
//! expressed as a symbol plus a calendar lookback; providers return a
//! validated [`PriceSeries`] ordered by date.
//!
//! ```rust,ignore
//! use stockcast_core::{HistoryRequest, PriceHistoryProvider, Symbol};
//!
//! async fn last_close(provider: &dyn PriceHistoryProvider) -> Option<f64> {
//!     let request = HistoryRequest::new(Symbol::parse("AAPL").ok()?, 365).ok()?;
//!     provider.history(request).await.ok()?.last_close()
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{PriceSeries, Symbol};

/// Smallest lookback a caller may request.
pub const MIN_LOOKBACK_DAYS: u32 = 1;
/// Largest lookback a caller may request (five calendar years).
pub const MAX_LOOKBACK_DAYS: u32 = 1_825;

/// Provider error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    InvalidRequest,
    NotFound,
    Unavailable,
    RateLimited,
    Internal,
}

/// Structured provider error. Nothing in the workspace retries on it; the
/// `retryable` flag is informational for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    pub fn not_found(symbol: &Symbol) -> Self {
        Self::new(
            SourceErrorKind::NotFound,
            format!("no price data found for '{symbol}'"),
        )
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream outages and throttling may clear on their own.
    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind,
            SourceErrorKind::Unavailable | SourceErrorKind::RateLimited
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for a daily history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub lookback_days: u32,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, lookback_days: u32) -> Result<Self, SourceError> {
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(SourceError::invalid_request(format!(
                "lookback must be within {MIN_LOOKBACK_DAYS}..={MAX_LOOKBACK_DAYS} days, got {lookback_days}"
            )));
        }
        Ok(Self {
            symbol,
            lookback_days,
        })
    }
}

/// Source of daily OHLCV history.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// request handler.
pub trait PriceHistoryProvider: Send + Sync {
    /// Stable provider identifier used in logs and health output.
    fn id(&self) -> &'static str;

    /// Fetches roughly `lookback_days` calendar days of daily bars ending
    /// today, ascending by date.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the symbol is unknown, the upstream is
    /// unreachable or throttled, or the payload cannot be normalized.
    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_lookback() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = HistoryRequest::new(symbol.clone(), 0).expect_err("zero");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
        assert!(HistoryRequest::new(symbol.clone(), MAX_LOOKBACK_DAYS + 1).is_err());
        assert!(HistoryRequest::new(symbol, 365).is_ok());
    }

    #[test]
    fn error_codes_are_stable() {
        let symbol = Symbol::parse("MSFT").expect("symbol");
        assert_eq!(SourceError::not_found(&symbol).code(), "source.not_found");
        assert_eq!(SourceError::rate_limited("slow down").code(), "source.rate_limited");
        assert!(SourceError::unavailable("down").retryable());
        assert!(!SourceError::internal("bug").retryable());
    }
}
