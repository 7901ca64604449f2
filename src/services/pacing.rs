use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Spacing policy between consecutive provider calls.
///
/// Only calls that actually reach the provider go through the pacer;
/// cache hits never wait.
#[async_trait]
pub trait PacingPolicy: Send + Sync {
    /// Wait until the next provider call may be issued.
    async fn wait_turn(&self);
}

/// Enforces a minimum interval between provider calls
///
/// The first call goes through immediately; each later call waits until
/// `min_delay` has passed since the previous one. Concurrent callers are
/// queued: each reserves its own slot under the lock.
pub struct FixedIntervalPacer {
    last_slot: Mutex<Option<Instant>>,
    min_delay: Duration,
}

impl FixedIntervalPacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            last_slot: Mutex::new(None),
            min_delay,
        }
    }

}

#[async_trait]
impl PacingPolicy for FixedIntervalPacer {
    async fn wait_turn(&self) {
        let slot = {
            let mut last = self.last_slot.lock();
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => (prev + self.min_delay).max(now),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        // Sleep outside the lock
        sleep_until(slot).await;
    }
}

/// Never waits. For tests and local runs against a stub provider.
pub struct NoopPacer;

#[async_trait]
impl PacingPolicy for NoopPacer {
    async fn wait_turn(&self) {}
}
