//! Connection supervisor
//!
//! Drives one client from accept to teardown:
//!
//! ```text
//! Connecting ──join ok──► Online ──idle timer──► Kicked ───────┐
//!     │                     │                                  ├─► Offline
//!     └──name taken──► Rejected   └──read EOF/error──► Disconnected ┘
//! ```
//!
//! Every terminal path runs the same teardown: the reader is stopped, the
//! session leaves the registry (closing its inbox), the writer flushes
//! what is queued and shuts the transport down, and both halves are
//! dropped.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;

use super::hub::Hub;
use crate::error::Result;
use crate::protocol::constants::WRITER_DRAIN_TIMEOUT;
use crate::protocol::message::{self, NOTICE_OFFLINE, NOTICE_ONLINE, REPLY_KICKED, REPLY_NAME_TAKEN};
use crate::session::{
    run_reader, run_writer, IdleTimer, Pulse, ReadOutcome, Session, SessionPhase, SessionState,
};

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Idle timeout expired
    Kicked,
    /// Peer closed or the read failed
    Disconnected,
    /// Could not join the registry
    Rejected,
}

/// Supervisor for a single client connection
pub struct Connection<S> {
    session_id: u64,
    stream: S,
    peer_addr: SocketAddr,
    hub: Arc<Hub>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(session_id: u64, stream: S, peer_addr: SocketAddr, hub: Arc<Hub>) -> Self {
        Self {
            session_id,
            stream,
            peer_addr,
            hub,
        }
    }

    /// Run the connection to completion
    pub async fn run(self) -> Result<Termination> {
        let Self {
            session_id,
            stream,
            peer_addr,
            hub,
        } = self;

        let mut state = SessionState::new(session_id, peer_addr);
        let (session, inbox) = hub.new_session(session_id, peer_addr);
        let (read_half, write_half) = tokio::io::split(stream);
        let writer = tokio::spawn(run_writer(session_id, inbox, write_half));

        let name = match hub.registry().join(Arc::clone(&session)).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(
                    session_id = session_id,
                    peer = %peer_addr,
                    error = %e,
                    "Session rejected"
                );
                // Never joined, so no fan-out can reach this inbox
                if let Err(e) = session.try_send(REPLY_NAME_TAKEN) {
                    tracing::debug!(session_id = session_id, error = %e, "Rejection notice not sent");
                }
                state.terminate(SessionPhase::Rejected);
                session.close_inbox();
                drain_writer(session_id, writer).await;
                hub.stats().connection_rejected();
                state.finish();
                return Ok(Termination::Rejected);
            }
        };

        state.go_online();
        hub.stats().session_online();
        tracing::info!(session_id = session_id, peer = %peer_addr, name = %name, "Session online");

        if let Err(e) = hub.broadcast_from(&session, NOTICE_ONLINE).await {
            tracing::debug!(session_id = session_id, error = %e, "Join notice not sent");
        }

        let pulse = Pulse::new();
        let mut reader = tokio::spawn(run_reader(
            Arc::clone(&session),
            Arc::clone(&hub),
            read_half,
            pulse.clone(),
        ));
        let mut timer = IdleTimer::new(hub.config().idle_timeout);

        let (phase, reader_done) = loop {
            tokio::select! {
                _ = pulse.wait() => {
                    state.on_pulse();
                    timer.reset();
                }
                outcome = &mut reader => {
                    match outcome {
                        Ok(ReadOutcome::Closed) => {
                            tracing::debug!(session_id = session_id, "Peer closed connection");
                        }
                        Ok(ReadOutcome::Failed(e)) => {
                            tracing::debug!(session_id = session_id, error = %e, "Read failed");
                        }
                        Err(e) => {
                            tracing::warn!(session_id = session_id, error = %e, "Reader task failed");
                        }
                    }
                    break (SessionPhase::Disconnected, true);
                }
                _ = timer.expired() => {
                    break (SessionPhase::Kicked, false);
                }
            }
        };

        if !state.terminate(phase) {
            // Unreachable: the loop above is the only terminal transition
            tracing::error!(session_id = session_id, phase = ?state.phase(), "Duplicate termination");
        }

        let farewell = if phase == SessionPhase::Kicked {
            hub.stats().session_kicked();
            Some(Bytes::from_static(REPLY_KICKED.as_bytes()))
        } else {
            None
        };

        if !reader_done {
            reader.abort();
            let _ = reader.await;
        }

        depart(&hub, &session, farewell).await;
        drain_writer(session_id, writer).await;
        state.finish();

        tracing::info!(
            session_id = session_id,
            peer = %peer_addr,
            reason = ?phase,
            pulses = state.pulses,
            duration_secs = state.duration().as_secs(),
            "Session offline"
        );

        Ok(match phase {
            SessionPhase::Kicked => Termination::Kicked,
            _ => Termination::Disconnected,
        })
    }
}

/// Leave the registry, send `farewell` as the session's last line and tell
/// everyone else
async fn depart(hub: &Hub, session: &Session, farewell: Option<Bytes>) {
    if let Some(name) = hub.registry().remove_session(session, farewell).await {
        hub.stats().session_offline();
        hub.bus()
            .publish(message::public_line(&session.peer_addr(), &name, NOTICE_OFFLINE))
            .await;
    }
}

/// Wait for the writer to flush and release the write half
async fn drain_writer(session_id: u64, mut writer: JoinHandle<u64>) {
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(lines)) => {
            tracing::trace!(session_id = session_id, lines = lines, "Writer drained");
        }
        Ok(Err(e)) => {
            tracing::warn!(session_id = session_id, error = %e, "Writer task failed");
        }
        Err(_) => {
            tracing::warn!(session_id = session_id, "Writer did not drain in time");
            writer.abort();
        }
    }
}
