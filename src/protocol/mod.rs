//! Chat wire protocol
//!
//! Line grammar, reply texts and the constants shared by the reader,
//! writer and supervisor.

pub mod command;
pub mod constants;
pub mod error;
pub mod message;

pub use command::Command;
pub use error::ProtocolError;
