//! Minimum spacing between consecutive geocoding requests.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Waits so that consecutive calls to [`wait`](Self::wait) return at least
/// `min_delay` apart. The first call returns immediately.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last: None,
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            sleep_until(last + self.min_delay).await;
        }
        self.last = Some(Instant::now());
    }
}
