//! Sliding-window call throttling.
//!
//! [`RateLimiter`] tracks the timestamps of recent calls and blocks the
//! caller until the oldest tracked call leaves the window whenever capacity
//! is reached. It serializes callers rather than queueing work.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Blocking sliding-window throttle: at most `max_calls` calls per `window`.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until a call slot is free, then claim it.
    ///
    /// Timestamps older than the window are dropped; when the remaining
    /// count is at capacity, the caller sleeps until the oldest tracked
    /// call ages out.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.lock();
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    calls.pop_front();
                }

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                // Time until the oldest call leaves the window. The queue is
                // non-empty here since max_calls is at least one slot behind.
                match calls.front() {
                    Some(oldest) => self.window - now.duration_since(*oldest),
                    None => return,
                }
            };
            sleep(wait).await;
        }
    }

    /// Run `call` once a slot is free.
    pub async fn run<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        call().await
    }

    /// Forget all tracked calls.
    pub fn reset(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn calls_under_capacity_do_not_block() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        let before = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn call_over_capacity_blocks_until_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;

        // Third call must wait until ~1s after the first.
        limiter.acquire().await;
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn slots_free_up_as_calls_age_out() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));

        limiter.acquire().await;
        sleep(Duration::from_secs(2)).await;

        // The tracked call is stale; this must not block.
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn run_throttles_the_wrapped_call() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));

        let start = Instant::now();
        let first = limiter.run(|| async { 1 }).await;
        let second = limiter.run(|| async { 2 }).await;

        assert_eq!((first, second), (1, 2));
        assert!(Instant::now() - start >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_tracked_calls() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        limiter.acquire().await;
        limiter.reset();

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }
}
