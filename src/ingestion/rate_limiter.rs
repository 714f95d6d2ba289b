use std::time::Duration;

use tokio::sync::Mutex;
// tokio's Instant so the refill clock follows virtual time under
// `start_paused` tests; identical to the std clock at runtime.
use tokio::time::Instant;

/// Process-wide token bucket gating every Market Data API call.
///
/// Refill and deduction both run inside one async critical section, and the
/// deficit wait sleeps while holding the lock: a burst of concurrent pollers
/// collapses into a globally paced call stream instead of racing the bucket.
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `rate` in tokens/second; the bucket starts full.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub async fn acquire(&self) {
        self.acquire_n(1.0).await
    }

    pub async fn acquire_n(&self, n: f64) {
        let mut state = self.state.lock().await;

        self.refill(&mut state);

        if state.tokens >= n {
            state.tokens -= n;
            return;
        }

        // Not enough tokens: sleep exactly long enough for the deficit to
        // refill. The lock stays held so every other caller queues behind us,
        // which is the strict global pause we want.
        let wait = (n - state.tokens) / self.rate;
        tokio::time::sleep(Duration::from_secs_f64(wait)).await;

        self.refill(&mut state);
        state.tokens = (state.tokens - n).max(0.0);
    }

    /// Current token count (refilled first). Test and stats helper.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
            state.last_refill = now;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokens_stay_within_bounds() {
        let limiter = RateLimiter::new(10.0, 20.0);

        for _ in 0..50 {
            limiter.acquire().await;
            let tokens = limiter.available().await;
            assert!(tokens >= 0.0, "tokens went negative: {tokens}");
            assert!(tokens <= 20.0, "tokens exceeded capacity: {tokens}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_drains_then_waits() {
        let limiter = RateLimiter::new(10.0, 5.0);

        // First five acquires consume the full bucket without waiting.
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        // The sixth must wait for a refill (~0.1s at 10 tokens/s).
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(99));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_capacity() {
        let limiter = RateLimiter::new(100.0, 10.0);

        limiter.acquire_n(10.0).await;
        tokio::time::advance(Duration::from_secs(60)).await;

        let tokens = limiter.available().await;
        assert!((tokens - 10.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquirers_serialize() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(10.0, 1.0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let l = limiter.clone();
            handles.push(tokio::spawn(async move { l.acquire().await }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let tokens = limiter.available().await;
        assert!(tokens >= 0.0 && tokens <= 1.0);
    }
}
