//! Broadcast bus
//!
//! A single FIFO of pre-formatted public lines. Exactly one consumer drains
//! it and fans each line out to every online session, so all listeners
//! observe broadcasts in the order they were enqueued.
//!
//! # Backpressure
//!
//! With unbounded inboxes the consumer never waits. With bounded inboxes a
//! single full inbox stalls the consumer (and the registry lock it holds)
//! until that session's writer drains. This is accepted: one slow client
//! delays every broadcast rather than losing lines.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::registry::Registry;
use crate::session::inbox::{line_channel, InboxReceiver, LineSender};

/// Single-consumer queue feeding [`Registry::fan_out`]
pub struct BroadcastBus {
    tx: LineSender,
    /// Held by the running consumer for its whole lifetime
    rx: Mutex<InboxReceiver>,
    registry: Arc<Registry>,
}

impl BroadcastBus {
    /// Create a bus delivering to `registry` (`capacity == 0` means unbounded)
    pub fn new(registry: Arc<Registry>, capacity: usize) -> Self {
        let (tx, rx) = line_channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
            registry,
        }
    }

    /// Enqueue a line for every online session
    pub async fn publish(&self, line: impl Into<Bytes>) {
        // The bus owns its receiver, so the queue outlives every publisher
        if let Err(e) = self.tx.send(line.into()).await {
            tracing::debug!(error = %e, "Broadcast dropped");
        }
    }

    /// Drain the queue forever
    ///
    /// A second concurrent call waits until the first one is dropped, so
    /// there is never more than one consumer.
    pub async fn run(&self) {
        let mut rx = self.rx.lock().await;
        while let Some(line) = rx.recv().await {
            let delivered = self.registry.fan_out(line).await;
            tracing::trace!(recipients = delivered, "Broadcast delivered");
        }
    }

    /// Deliver every line queued right now, without waiting for more
    ///
    /// Returns the number of lines delivered.
    pub async fn drain_pending(&self) -> usize {
        let mut rx = self.rx.lock().await;
        let mut count = 0;
        while let Some(line) = rx.try_recv() {
            self.registry.fan_out(line).await;
            count += 1;
        }
        count
    }

    /// Spawn the consumer loop
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_consumer(self: &Arc<Self>) -> JoinHandle<()> {
        let bus = Arc::clone(self);
        tokio::spawn(async move { bus.run().await })
    }
}
