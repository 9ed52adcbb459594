//! Cooperative shutdown signalling.
//!
//! The engine owns a [`ShutdownFlag`]; any component holding a clone of the
//! handle can request shutdown, and the heartbeat loop observes it at its
//! next yield point.

use std::cell::Cell;
use tokio::sync::Notify;

/// One-way latch that wakes the engine's run loop.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: Cell<bool>,
    notify: Notify,
}

impl ShutdownFlag {
    pub fn request(&self) {
        self.requested.set(true);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// Resolves when shutdown has been requested (immediately if it already
    /// was).
    pub async fn notified(&self) {
        if self.requested.get() {
            return;
        }
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_notified_resolves_after_request() {
        let flag = Rc::new(ShutdownFlag::default());
        assert!(!flag.is_requested());

        flag.request();
        assert!(flag.is_requested());
        // Must not hang: the latch is already set.
        flag.notified().await;
    }
}
