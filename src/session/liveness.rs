//! Liveness pulse and idle timer
//!
//! The reader emits a pulse for every line it processes; the supervisor
//! resets its idle timer whenever it observes one. The pulse is a
//! single-slot signal: beats that arrive while nobody is waiting collapse
//! into one pending wakeup, so the reader never blocks on it.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, Sleep};

/// Single-slot liveness signal
#[derive(Debug, Clone, Default)]
pub struct Pulse {
    notify: Arc<Notify>,
}

impl Pulse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal activity; never blocks
    pub fn beat(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next beat, or consume a pending one
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Resettable inactivity deadline
#[derive(Debug)]
pub struct IdleTimer {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl IdleTimer {
    /// Start a timer that expires `timeout` from now
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
        }
    }

    /// Push the deadline to `timeout` from now
    pub fn reset(&mut self) {
        let deadline = Instant::now() + self.timeout;
        self.sleep.as_mut().reset(deadline);
    }

    pub fn deadline(&self) -> Instant {
        self.sleep.deadline()
    }

    /// Resolve once the deadline passes
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await;
    }
}
