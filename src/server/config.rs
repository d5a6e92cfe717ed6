//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::protocol::constants::*;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Idle timeout (kick if no line is processed)
    pub idle_timeout: Duration,

    /// Maximum bytes consumed per transport read
    pub read_buffer_size: usize,

    /// Per-session inbox capacity (0 = unbounded)
    ///
    /// A bounded inbox that fills up stalls the broadcast consumer until it
    /// drains.
    pub inbox_capacity: usize,

    /// Broadcast queue capacity (0 = unbounded)
    pub broadcast_capacity: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            idle_timeout: IDLE_TIMEOUT,
            read_buffer_size: READ_BUFFER_SIZE,
            inbox_capacity: 0,
            broadcast_capacity: 0,
            tcp_nodelay: true, // Chat lines are small
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set read chunk size, capped at [`READ_BUFFER_SIZE`]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(1, READ_BUFFER_SIZE);
        self
    }

    /// Set per-session inbox capacity
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    /// Set broadcast queue capacity
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }
}
