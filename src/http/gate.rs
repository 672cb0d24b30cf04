use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Enforces a minimum delay between consecutive dispatches.
///
/// One gate is shared by every request issued through a transport, across
/// all regions. A zero interval disables pacing.
pub struct RateGate {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self { limiter }
    }

    /// Wait until this caller may dispatch.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    // Scheduling slack for wall-clock assertions.
    const SLACK: Duration = Duration::from_millis(15);

    #[tokio::test]
    async fn first_dispatch_is_immediate() {
        let gate = RateGate::new(Duration::from_millis(500));
        let start = Instant::now();
        gate.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let gate = RateGate::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..50 {
            gate.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn consecutive_dispatches_are_spaced() {
        let gate = RateGate::new(Duration::from_millis(100));
        let start = Instant::now();
        gate.wait().await;
        gate.wait().await;
        gate.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(200) - SLACK);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_gate() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(80)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.wait().await;
                Instant::now()
            }));
        }

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(80) - SLACK);
        }
        assert!(start.elapsed() >= Duration::from_millis(240) - SLACK);
    }
}
