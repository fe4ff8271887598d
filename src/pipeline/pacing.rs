//! Request pacing and cancellation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Allows at most `batch` requests in any `window`-long interval.
///
/// Keeps the start times of the last `batch` requests; a new request waits
/// until the oldest of them is `window` old.
#[derive(Debug)]
pub struct RateLimiter {
    batch: usize,
    window: Duration,
    recent: VecDeque<Instant>,
}

impl RateLimiter {
    /// `batch == 0` disables pacing.
    pub fn new(batch: usize, window: Duration) -> Self {
        Self {
            batch,
            window,
            recent: VecDeque::with_capacity(batch),
        }
    }

    /// Wait (if needed) and account for one request.
    pub async fn acquire(&mut self) {
        if self.batch == 0 {
            return;
        }

        if self.recent.len() >= self.batch {
            if let Some(oldest) = self.recent.pop_front() {
                let elapsed = oldest.elapsed();
                if elapsed < self.window {
                    let wait = self.window - elapsed;
                    tracing::info!("rate limit: pausing {:.1}s", wait.as_secs_f32());
                    tokio::time::sleep(wait).await;
                }
            }
        }

        self.recent.push_back(Instant::now());
    }
}

/// Shared stop request, checked between objects.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_batch_not_delayed() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(25));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_request_waits_for_window() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(25));
        let start = Instant::now();
        for _ in 0..6 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(25));
        assert!(start.elapsed() < Duration::from_secs(26));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_batch_does_not_wait() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(12)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_burst_across_window_boundary() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        let mut times = Vec::new();

        limiter.acquire().await;
        times.push(start.elapsed());
        tokio::time::sleep(Duration::from_secs(9)).await;
        limiter.acquire().await;
        times.push(start.elapsed());
        tokio::time::sleep(Duration::from_secs(1)).await;
        limiter.acquire().await;
        times.push(start.elapsed());
        limiter.acquire().await;
        times.push(start.elapsed());

        let secs: Vec<u64> = times.iter().map(|t| t.as_secs()).collect();
        assert_eq!(secs, vec![0, 9, 10, 19]);
        // every pair `batch` apart is at least one window apart
        for pair in times.windows(3) {
            assert!(pair[2] - pair[0] >= Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_batch_disables() {
        let mut limiter = RateLimiter::new(0, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..20 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
