//! Per-connection session handle
//!
//! A `Session` is shared between the registry, the supervisor and the
//! reader task. Its display name is not stored here: the registry owns the
//! name so that it is only ever read or written under the registry lock.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;

use super::inbox::{Inbox, InboxReceiver};
use crate::error::Result;

/// Server-side state for one connected client
#[derive(Debug)]
pub struct Session {
    /// Unique session ID
    id: u64,

    /// Remote peer address
    peer_addr: SocketAddr,

    /// Outbound lines awaiting the writer
    inbox: Inbox,
}

impl Session {
    /// Create a session and the receiver its writer task drains
    pub fn new(id: u64, peer_addr: SocketAddr, inbox_capacity: usize) -> (Arc<Self>, InboxReceiver) {
        let (inbox, rx) = Inbox::channel(inbox_capacity);
        let session = Arc::new(Self {
            id,
            peer_addr,
            inbox,
        });
        (session, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Name a session joins under: its remote address
    pub fn default_name(&self) -> String {
        self.peer_addr.to_string()
    }

    /// Queue a line for this session's client
    pub async fn send(&self, line: impl Into<Bytes>) -> Result<()> {
        self.inbox.push(line.into()).await
    }

    /// Queue a line without waiting, dropping it if a bounded inbox is full
    pub fn try_send(&self, line: impl Into<Bytes>) -> Result<bool> {
        self.inbox.try_push(line.into())
    }

    pub(crate) fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub(crate) fn close_inbox(&self) -> bool {
        self.inbox.close()
    }
}
