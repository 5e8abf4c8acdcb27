use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Client-side request ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Length of the window
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Harvest allows 50 requests per 10 seconds per key.
        Self {
            max_requests: 50,
            window: Duration::from_secs(10),
        }
    }
}

/// Bounds on retrying a request the server answered with 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Upper bound on the summed Retry-After waits of one call
    pub max_total_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_total_wait: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Whether another wait of `delay` is allowed after `retries` retries
    /// that already waited `waited` in total.
    pub fn allows(&self, retries: u32, waited: Duration, delay: Duration) -> bool {
        retries < self.max_retries && waited + delay <= self.max_total_wait
    }
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    /// Unset until the first request opens a window.
    started: Option<Instant>,
}

/// Fixed window limiter. A window opens at the first request after the
/// previous one expired.
///
/// The counter and window start are only touched under the mutex, and the
/// mutex is never held across a sleep, so one throttled caller does not
/// stall callers that still fit in the window.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                count: 0,
                started: None,
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Waits until a request fits in the current window and records it.
    pub async fn acquire(&self) {
        loop {
            let wait = self.try_acquire();
            match wait {
                None => return,
                Some(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Local rate limit reached, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Records a request if one fits, otherwise returns how long to wait.
    fn try_acquire(&self) -> Option<Duration> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        let started = match state.started {
            Some(started) if now.saturating_duration_since(started) < self.config.window => started,
            _ => {
                state.count = 0;
                state.started = Some(now);
                now
            }
        };

        if state.count < self.config.max_requests {
            state.count += 1;
            return None;
        }

        let elapsed = now.saturating_duration_since(started);
        Some(self.config.window.saturating_sub(elapsed).max(Duration::from_millis(1)))
    }

    /// Requests recorded in the current window.
    pub fn in_window(&self) -> u32 {
        self.state
            .lock()
            .map(|state| state.count)
            .unwrap_or_else(|poisoned| poisoned.into_inner().count)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_within_ceiling_do_not_wait() {
        let limiter = limiter(3, 10);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_ceiling_waits_for_window_and_counts_as_first() {
        let limiter = limiter(3, 10);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        tokio::time::advance(Duration::from_secs(4)).await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
        assert_eq!(limiter.in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_opens_at_first_request_not_at_construction() {
        let limiter = limiter(3, 10);
        tokio::time::advance(Duration::from_millis(9_500)).await;

        let first = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(first.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(first.elapsed() >= Duration::from_secs(10));
        assert_eq!(limiter.in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_window_resets_without_waiting() {
        let limiter = limiter(2, 10);

        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(11)).await;

        let before = Instant::now();
        limiter.acquire().await;

        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_the_ceiling() {
        let limiter = Arc::new(limiter(5, 10));
        let start = Instant::now();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut elapsed = Vec::new();
        for handle in handles {
            elapsed.push(handle.await.unwrap());
        }
        elapsed.sort();

        // 5 immediately, 5 after one window, 2 after two windows.
        assert!(elapsed[..5].iter().all(|e| *e < Duration::from_secs(10)));
        assert!(elapsed[5..10].iter().all(|e| *e >= Duration::from_secs(10)));
        assert!(elapsed[10..].iter().all(|e| *e >= Duration::from_secs(20)));
    }

    #[test]
    fn test_retry_policy_bounds() {
        let policy = RetryPolicy {
            max_retries: 2,
            max_total_wait: Duration::from_secs(30),
        };

        assert!(policy.allows(0, Duration::ZERO, Duration::from_secs(10)));
        assert!(policy.allows(1, Duration::from_secs(10), Duration::from_secs(20)));
        assert!(!policy.allows(2, Duration::ZERO, Duration::ZERO));
        assert!(!policy.allows(1, Duration::from_secs(20), Duration::from_secs(11)));
    }
}
