//! Registry listing types

use std::net::SocketAddr;

/// One online session as seen by a `who` listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineEntry {
    /// Session ID
    pub session_id: u64,
    /// Remote peer address
    pub peer_addr: SocketAddr,
    /// Display name at the time of the snapshot
    pub name: String,
}
