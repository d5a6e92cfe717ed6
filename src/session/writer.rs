//! Session writer task
//!
//! Drains the inbox to the transport, one delimiter-terminated line per
//! entry. Write failures are logged and skipped; only the reader side
//! drives the session lifecycle.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::inbox::InboxReceiver;
use crate::protocol::constants::LINE_DELIMITER;

/// Write queued lines until the inbox is closed and empty
///
/// Shuts the write half down before returning. Returns the number of lines
/// written successfully.
pub async fn run_writer<W>(session_id: u64, mut inbox: InboxReceiver, mut writer: W) -> u64
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(256);
    let mut written = 0u64;

    while let Some(line) = inbox.recv().await {
        buf.clear();
        buf.reserve(line.len() + 1);
        buf.extend_from_slice(&line);
        buf.put_u8(LINE_DELIMITER);

        let result = match writer.write_all(&buf).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(session_id = session_id, error = %e, "Failed to write line");
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!(session_id = session_id, error = %e, "Write shutdown failed");
    }

    tracing::trace!(session_id = session_id, lines = written, "Writer finished");
    written
}

#[cfg(test)]
mod tests {
    use std::io;

    use bytes::Bytes;

    use super::*;
    use crate::session::inbox::Inbox;

    #[tokio::test]
    async fn test_writes_lines_with_delimiter() {
        let (inbox, rx) = Inbox::channel(0);
        inbox.push(Bytes::from_static(b"hello")).await.unwrap();
        inbox.push(Bytes::from_static(b"[1.2.3.4:5]bob: hi")).await.unwrap();
        inbox.close();

        let mock = tokio_test::io::Builder::new()
            .write(b"hello\n")
            .write(b"[1.2.3.4:5]bob: hi\n")
            .build();

        let written = run_writer(1, rx, mock).await;
        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn test_write_error_does_not_stop_writer() {
        let (inbox, rx) = Inbox::channel(0);
        inbox.push(Bytes::from_static(b"lost")).await.unwrap();
        inbox.push(Bytes::from_static(b"kept")).await.unwrap();
        inbox.close();

        let mock = tokio_test::io::Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
            .write(b"kept\n")
            .build();

        let written = run_writer(1, rx, mock).await;
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn test_closed_empty_inbox_returns_immediately() {
        let (inbox, rx) = Inbox::channel(0);
        inbox.close();

        let mock = tokio_test::io::Builder::new().build();
        assert_eq!(run_writer(1, rx, mock).await, 0);
    }
}
