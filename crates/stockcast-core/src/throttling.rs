use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::SourceError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Outbound request budget for one provider.
///
/// Requests over budget fail fast with [`SourceError::rate_limited`]; the
/// caller decides what to do with that, nothing here waits or retries.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
    quota_limit: u32,
    quota_window: Duration,
}

impl Throttle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let quota_limit = quota_limit.max(1);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            quota_limit,
            quota_window,
        }
    }

    pub fn per_minute(quota_limit: u32) -> Self {
        Self::new(Duration::from_secs(60), quota_limit)
    }

    pub fn acquire(&self) -> Result<(), SourceError> {
        self.limiter.check().map_err(|_| {
            SourceError::rate_limited(format!(
                "provider budget of {} requests per {}s exhausted",
                self.quota_limit,
                self.quota_window.as_secs()
            ))
        })
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("quota_limit", &self.quota_limit)
            .field("quota_window", &self.quota_window)
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    #[test]
    fn rejects_when_budget_is_exhausted() {
        let throttle = Throttle::per_minute(2);

        assert!(throttle.acquire().is_ok());
        assert!(throttle.acquire().is_ok());

        let err = throttle.acquire().expect_err("third request should be throttled");
        assert_eq!(err.kind(), SourceErrorKind::RateLimited);
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let throttle = Throttle::per_minute(0);
        assert!(throttle.acquire().is_ok());
        assert!(throttle.acquire().is_err());
    }
}
