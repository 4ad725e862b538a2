//! Client-side request throttle
//!
//! Token bucket from the governor crate. Only built when
//! `max_requests_per_second` is set; the API's own 429 answers are handled
//! by the retry loop either way.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Requests allowed per second and how many may go out back to back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained rate
    pub requests_per_second: u32,
    /// Bucket size
    pub burst_size: u32,
}

impl RateLimiterConfig {
    /// Throttle to `requests_per_second`, allowing a burst of the same size
    pub fn per_second(requests_per_second: u32) -> Self {
        Self {
            requests_per_second,
            burst_size: requests_per_second,
        }
    }
}

/// Shared token bucket, cloned into every request path
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Build a bucket; zero rates are raised to one
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(rate).allow_burst(burst))),
        }
    }

    /// Wait for a permit
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn test_per_second_burst_matches_rate() {
        let config = RateLimiterConfig::per_second(4);
        assert_eq!(config.requests_per_second, 4);
        assert_eq!(config.burst_size, 4);
    }

    #[tokio::test]
    async fn test_burst_then_throttled() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(3));
        for _ in 0..3 {
            assert!(timeout(SHORT, limiter.wait()).await.is_ok());
        }
        assert!(timeout(SHORT, limiter.wait()).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_rate_allows_one() {
        let limiter = RateLimiter::new(&RateLimiterConfig::per_second(0));
        assert!(timeout(SHORT, limiter.wait()).await.is_ok());
        assert!(timeout(SHORT, limiter.wait()).await.is_err());
    }
}
