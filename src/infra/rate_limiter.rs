use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token bucket over requests per minute.
///
/// The bucket starts with one token so the first call never waits; bursting
/// a full minute's allowance at start-up would break per-second usage
/// policies.
#[derive(Debug)]
pub struct RequestRateLimiter {
    requests_per_min: u64,
    bucket: Mutex<(f64, Instant)>,
}

impl RequestRateLimiter {
    /// `0` disables limiting.
    pub fn per_minute(requests_per_min: u64) -> Self {
        Self {
            requests_per_min,
            bucket: Mutex::new((1.0, Instant::now())),
        }
    }

    pub async fn acquire(&self) {
        if self.requests_per_min == 0 {
            return;
        }
        let capacity = self.requests_per_min as f64;
        let refill_rate = capacity / 60.0; // tokens per second

        loop {
            let mut guard = self.bucket.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *tokens = (*tokens + elapsed * refill_rate).min(capacity);
            *last = now;
            if *tokens >= 1.0 {
                *tokens -= 1.0;
                return;
            }
            let wait = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(wait.max(0.001))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_immediate() {
        let limiter = RequestRateLimiter::per_minute(60);
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn second_request_waits_for_refill() {
        let limiter = RequestRateLimiter::per_minute(600); // one every 100ms
        limiter.acquire().await;
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn zero_disables_limiting() {
        let limiter = RequestRateLimiter::per_minute(0);
        let started = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
