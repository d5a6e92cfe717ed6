//! Session reader task
//!
//! Reads the transport in bounded chunks, splits complete lines, strips the
//! trailing delimiter and hands each line to the dispatcher. A liveness
//! pulse follows every line that was dispatched successfully.

use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::context::Session;
use super::dispatcher::dispatch;
use super::liveness::Pulse;
use crate::protocol::constants::{LINE_DELIMITER, READ_BUFFER_SIZE};
use crate::server::Hub;

/// Why the reader stopped
#[derive(Debug)]
pub enum ReadOutcome {
    /// Zero-length read: the peer closed the connection
    Closed,
    /// The transport returned an error
    Failed(io::Error),
}

/// Read and dispatch lines until the transport closes or fails
pub async fn run_reader<R>(session: Arc<Session>, hub: Arc<Hub>, mut reader: R, pulse: Pulse) -> ReadOutcome
where
    R: AsyncRead + Unpin,
{
    // The config field is public, so the builder's bound is not enough
    let limit = hub.config().read_buffer_size.clamp(1, READ_BUFFER_SIZE);
    let mut chunk = vec![0u8; limit];
    let mut pending = BytesMut::with_capacity(limit);

    loop {
        // Never hold more than `limit` unterminated bytes
        let room = limit - pending.len();
        let n = match reader.read(&mut chunk[..room]).await {
            Ok(0) => return ReadOutcome::Closed,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return ReadOutcome::Closed,
            Err(e) => return ReadOutcome::Failed(e),
        };
        pending.extend_from_slice(&chunk[..n]);

        while let Some(pos) = pending.iter().position(|b| *b == LINE_DELIMITER) {
            let line = pending.split_to(pos + 1);
            process_line(&session, &hub, &line[..pos], &pulse).await;
        }

        if pending.len() >= limit {
            let line = pending.split();
            process_line(&session, &hub, &line, &pulse).await;
        }
    }
}

async fn process_line(session: &Arc<Session>, hub: &Hub, raw: &[u8], pulse: &Pulse) {
    let text = String::from_utf8_lossy(raw);

    match dispatch(hub, session, &text).await {
        Ok(()) => pulse.beat(),
        Err(e) => {
            tracing::debug!(
                session_id = session.id(),
                error = %e,
                "Failed to process line"
            );
        }
    }
}
