//! Per-provider call spacing.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum delay between two calls to the same provider.
///
/// Process-local. Each caller reserves the next free slot for its provider
/// under a short lock and sleeps after releasing it, so callers for one
/// provider are spaced out without blocking other providers.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    /// Latest reserved call time per provider.
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        RateLimiter {
            min_delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait until `provider` may be called again.
    pub async fn acquire(&self, provider: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let (now, ready_at) = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let ready_at = slots
                .get(provider)
                .map_or(now, |prev| (*prev + self.min_delay).max(now));
            slots.insert(provider.to_string(), ready_at);
            (now, ready_at)
        };

        if ready_at > now {
            debug!(
                provider,
                wait_ms = (ready_at - now).as_millis() as u64,
                "Rate limiting provider call"
            );
            tokio::time::sleep_until(ready_at).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire("claude").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_waits_min_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        let start = Instant::now();
        limiter.acquire("claude").await;
        limiter.acquire("claude").await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        limiter.acquire("openai").await;
        tokio::time::advance(Duration::from_millis(700)).await;

        let start = Instant::now();
        limiter.acquire("openai").await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire("claude").await;
        limiter.acquire("openai").await;
        limiter.acquire("gemini").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiting_provider_does_not_block_others() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(5)));
        limiter.acquire("claude").await;

        let start = Instant::now();
        let waiting = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.acquire("claude").await;
                Instant::now()
            })
        };
        // Let the spawned claude call reach its sleep
        tokio::task::yield_now().await;

        limiter.acquire("openai").await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        let claude_at = waiting.await.unwrap();
        assert_eq!(claude_at - start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire("claude").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(500)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire("gemini").await })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        // Three calls: 0ms, 500ms, 1000ms
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
