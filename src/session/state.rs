//! Session state machine
//!
//! Tracks a connection from accept to teardown and guarantees a single
//! terminal transition.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Accepted, not yet in the registry
    Connecting,
    /// Registered and reading input
    Online,
    /// Could not join (default name already in use)
    Rejected,
    /// Removed for inactivity
    Kicked,
    /// Peer closed the connection or the read failed
    Disconnected,
    /// Torn down; the transport has been released
    Offline,
}

impl SessionPhase {
    /// Whether this phase ends the session
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::Rejected
                | SessionPhase::Kicked
                | SessionPhase::Disconnected
                | SessionPhase::Offline
        )
    }
}

/// Supervisor-side state for one connection
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    phase: SessionPhase,

    /// Accept time
    pub connected_at: Instant,

    /// Number of idle timer resets
    pub pulses: u64,
}

impl SessionState {
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connecting,
            connected_at: Instant::now(),
            pulses: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Connecting → Online
    pub fn go_online(&mut self) -> bool {
        if self.phase != SessionPhase::Connecting {
            return false;
        }
        self.phase = SessionPhase::Online;
        true
    }

    /// Record a liveness pulse
    pub fn on_pulse(&mut self) {
        self.pulses += 1;
    }

    /// Enter a terminal phase
    ///
    /// `Rejected` is only reachable from `Connecting`; `Kicked` and
    /// `Disconnected` only from `Online`. Any second attempt returns `false`
    /// and leaves the phase untouched.
    pub fn terminate(&mut self, to: SessionPhase) -> bool {
        let allowed = match (self.phase, to) {
            (SessionPhase::Connecting, SessionPhase::Rejected) => true,
            (SessionPhase::Online, SessionPhase::Kicked | SessionPhase::Disconnected) => true,
            _ => false,
        };
        if allowed {
            self.phase = to;
        }
        allowed
    }

    /// Terminal phase → Offline
    pub fn finish(&mut self) {
        if self.phase.is_terminal() {
            self.phase = SessionPhase::Offline;
        }
    }

    /// Time since accept
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
