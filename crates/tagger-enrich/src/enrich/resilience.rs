//! Resilience primitives for enrichment providers.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::context::LookupContext;
use crate::error::EnrichResult;

/// Per-provider rate limiter enforcing a minimum interval between requests.
///
/// The instant of the last granted request is kept behind a mutex, so
/// concurrent callers sharing one provider are serialized and each still
/// observes the full interval.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a `RateLimiter` that allows at most `requests_per_second`
    /// requests per second. Zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = u64::from(requests_per_second.max(1));
        Self::with_interval(Duration::from_millis(1000 / rps))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the interval since the previous request has elapsed,
    /// then records this request.
    ///
    /// If `ctx` ends first the wait is abandoned, no request is recorded,
    /// and the cancellation error is returned as-is.
    pub async fn acquire(&self, ctx: &LookupContext) -> EnrichResult<()> {
        ctx.run(async {
            let mut last = self.last_request.lock().await;

            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < self.interval {
                    let wait = self.interval - elapsed;
                    log::debug!("Rate limiting: waiting {:?}", wait);
                    sleep(wait).await;
                }
            }

            *last = Some(Instant::now());
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnrichError;

    #[test]
    fn test_interval_from_requests_per_second() {
        assert_eq!(RateLimiter::new(1).interval(), Duration::from_secs(1));
        assert_eq!(RateLimiter::new(4).interval(), Duration::from_millis(250));
        assert_eq!(RateLimiter::new(0).interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        limiter.acquire(&LookupContext::new()).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::new(1);
        let ctx = LookupContext::new();
        let start = Instant::now();

        limiter.acquire(&ctx).await.unwrap();
        limiter.acquire(&ctx).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_context_aborts_wait() {
        let limiter = RateLimiter::new(1);
        limiter.acquire(&LookupContext::new()).await.unwrap();

        let ctx = LookupContext::new();
        ctx.cancel();
        let result = limiter.acquire(&ctx).await;
        assert_eq!(result, Err(EnrichError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_wait() {
        let limiter = RateLimiter::new(1);
        limiter.acquire(&LookupContext::new()).await.unwrap();

        let ctx = LookupContext::new().with_timeout(Duration::from_millis(200));
        let result = limiter.acquire(&ctx).await;
        assert_eq!(result, Err(EnrichError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = std::sync::Arc::new(RateLimiter::with_interval(Duration::from_millis(500)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = std::sync::Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire(&LookupContext::new()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
