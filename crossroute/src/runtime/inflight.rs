//! Per-route in-flight exchange accounting used by stop-time draining.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

pub(crate) struct InflightTracker {
    count: AtomicUsize,
    drained: Notify,
}

impl InflightTracker {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    pub(crate) fn enter(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn exit(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    pub(crate) fn current(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Waits up to `grace` for in-flight exchanges to drain. Returns `true`
    /// when the count reached zero within the grace period.
    pub(crate) async fn drain(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            // Register interest before checking, so a concurrent exit cannot
            // slip between the check and the wait.
            let notified = self.drained.notified();
            if self.current() == 0 {
                return true;
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.current() == 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InflightTracker;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn drain_returns_immediately_when_idle() {
        let tracker = InflightTracker::new();

        assert!(tracker.drain(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn drain_waits_for_inflight_exchanges() {
        let tracker = Arc::new(InflightTracker::new());
        tracker.enter();

        let background = tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            background.exit();
        });

        assert!(tracker.drain(Duration::from_secs(1)).await);
        assert_eq!(tracker.current(), 0);
    }

    #[tokio::test]
    async fn drain_gives_up_after_the_grace_period() {
        let tracker = InflightTracker::new();
        tracker.enter();

        assert!(!tracker.drain(Duration::from_millis(20)).await);
        assert_eq!(tracker.current(), 1);
    }
}
