//! Statistics for the chat server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Server-wide counters, updated lock-free from every connection task
#[derive(Debug)]
pub struct ServerStats {
    started_at: Instant,
    total_connections: AtomicU64,
    active_sessions: AtomicU64,
    rejected_connections: AtomicU64,
    broadcasts: AtomicU64,
    private_messages: AtomicU64,
    kicked_sessions: AtomicU64,
}

/// Point-in-time copy of [`ServerStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections accepted since start
    pub total_connections: u64,
    /// Sessions currently in the registry
    pub active_sessions: u64,
    /// Connections refused (limit reached or name collision)
    pub rejected_connections: u64,
    /// Lines queued on the broadcast bus
    pub broadcasts: u64,
    /// Private messages delivered
    pub private_messages: u64,
    /// Sessions removed by the idle timeout
    pub kicked_sessions: u64,
    /// Time since the stats were created
    pub uptime: Duration,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            private_messages: AtomicU64::new(0),
            kicked_sessions: AtomicU64::new(0),
        }
    }

    pub fn connection_accepted(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_online(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_offline(&self) {
        // Saturating: never wrap below zero
        let _ = self
            .active_sessions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn private_message(&self) {
        self.private_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_kicked(&self) {
        self.kicked_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            private_messages: self.private_messages.load(Ordering::Relaxed),
            kicked_sessions: self.kicked_sessions.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
