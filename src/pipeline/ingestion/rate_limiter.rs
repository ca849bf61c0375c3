use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token bucket limiting outbound requests per minute
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_min: Option<u64>,
    // tokens currently available and the time of the last refill
    bucket: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    pub fn new(requests_per_min: Option<u64>) -> Self {
        let capacity = requests_per_min.unwrap_or(0) as f64;
        Self {
            requests_per_min,
            bucket: Mutex::new((capacity, Instant::now())),
        }
    }

    /// Limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Wait until one request may be sent.
    pub async fn acquire(&self) {
        let Some(rpm) = self.requests_per_min.filter(|rpm| *rpm > 0) else {
            return;
        };
        let capacity = rpm as f64;
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
                break;
            }
            let secs = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(secs.max(0.001))).await;
        }
    }
}
