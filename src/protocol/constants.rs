//! Protocol and session constants

use std::time::Duration;

/// A session with no successfully processed input for this long is kicked
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum bytes consumed from the transport per read call
pub const READ_BUFFER_SIZE: usize = 4096;

/// Terminates every line in both directions
pub const LINE_DELIMITER: u8 = b'\n';

/// Separates fields in `rename|` and `to|` commands
pub const FIELD_DELIMITER: char = '|';

/// Port used when only an IP is given
pub const DEFAULT_PORT: u16 = 8888;

/// How long a closing writer may keep flushing queued lines
pub const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// List online users
pub const CMD_WHO: &str = "who";

/// Change display name: `rename|<name>`
pub const CMD_RENAME_PREFIX: &str = "rename|";

/// Private message: `to|<name>|<text>`
pub const CMD_PRIVATE_PREFIX: &str = "to|";
