//! Session inbox
//!
//! An ordered queue of outbound lines drained by the session writer. The
//! queue is bounded when created with a non-zero capacity and unbounded
//! otherwise. The same queue type backs the broadcast bus.
//!
//! Lines are `Bytes` so a fanned-out broadcast shares one allocation across
//! every recipient.

use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Sending side of a line queue
#[derive(Debug, Clone)]
pub(crate) enum LineSender {
    Bounded(mpsc::Sender<Bytes>),
    Unbounded(mpsc::UnboundedSender<Bytes>),
}

impl LineSender {
    /// Enqueue a line, waiting for room if the queue is bounded
    pub(crate) async fn send(&self, line: Bytes) -> Result<()> {
        match self {
            LineSender::Bounded(tx) => tx.send(line).await.map_err(|_| Error::InboxClosed),
            LineSender::Unbounded(tx) => tx.send(line).map_err(|_| Error::InboxClosed),
        }
    }

    /// Enqueue a line without waiting; a full bounded queue drops it
    pub(crate) fn try_send(&self, line: Bytes) -> Result<bool> {
        match self {
            LineSender::Bounded(tx) => match tx.try_send(line) {
                Ok(()) => Ok(true),
                Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
                Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::InboxClosed),
            },
            LineSender::Unbounded(tx) => tx.send(line).map(|_| true).map_err(|_| Error::InboxClosed),
        }
    }
}

/// Receiving side of a line queue
#[derive(Debug)]
pub enum InboxReceiver {
    Bounded(mpsc::Receiver<Bytes>),
    Unbounded(mpsc::UnboundedReceiver<Bytes>),
}

impl InboxReceiver {
    /// Next line, or `None` once the queue is closed and drained
    pub async fn recv(&mut self) -> Option<Bytes> {
        match self {
            InboxReceiver::Bounded(rx) => rx.recv().await,
            InboxReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Next line if one is queued right now
    pub fn try_recv(&mut self) -> Option<Bytes> {
        match self {
            InboxReceiver::Bounded(rx) => rx.try_recv().ok(),
            InboxReceiver::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// Create a line queue (`capacity == 0` means unbounded)
pub(crate) fn line_channel(capacity: usize) -> (LineSender, InboxReceiver) {
    if capacity > 0 {
        let (tx, rx) = mpsc::channel(capacity);
        (LineSender::Bounded(tx), InboxReceiver::Bounded(rx))
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        (LineSender::Unbounded(tx), InboxReceiver::Unbounded(rx))
    }
}

/// Closable sending side owned by a session
#[derive(Debug)]
pub struct Inbox {
    tx: Mutex<Option<LineSender>>,
}

impl Inbox {
    /// Create an inbox and the receiver its writer drains
    pub fn channel(capacity: usize) -> (Self, InboxReceiver) {
        let (tx, rx) = line_channel(capacity);
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    fn sender(&self) -> Option<LineSender> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Queue a line for the writer
    ///
    /// With a bounded inbox this waits until the writer makes room.
    pub async fn push(&self, line: Bytes) -> Result<()> {
        match self.sender() {
            Some(tx) => tx.send(line).await,
            None => Err(Error::InboxClosed),
        }
    }

    /// Queue a line without waiting
    ///
    /// Returns `Ok(false)` if a bounded inbox is full and the line was dropped.
    pub fn try_push(&self, line: Bytes) -> Result<bool> {
        match self.sender() {
            Some(tx) => tx.try_send(line),
            None => Err(Error::InboxClosed),
        }
    }

    /// Close the inbox; the writer drains what is queued and then stops
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
