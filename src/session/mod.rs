//! Session handling
//!
//! Each connection owns a [`Session`], a writer task draining its inbox to
//! the transport, and a reader task feeding lines to the dispatcher.

pub mod context;
pub mod dispatcher;
pub mod inbox;
pub mod liveness;
pub mod reader;
pub mod state;
pub mod writer;

pub use context::Session;
pub use dispatcher::dispatch;
pub use inbox::{Inbox, InboxReceiver};
pub use liveness::{IdleTimer, Pulse};
pub use reader::{run_reader, ReadOutcome};
pub use state::{SessionPhase, SessionState};
pub use writer::run_writer;
