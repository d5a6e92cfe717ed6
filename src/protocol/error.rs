//! Protocol error types

use std::fmt;

use super::message;

/// A client line that matched a command prefix but is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// `to||text`
    EmptyRecipient,
    /// `to|name` without a text field
    MissingText,
    /// Empty name or name containing the field delimiter
    InvalidName(String),
}

impl ProtocolError {
    /// Text sent back to the offending client
    pub fn reply(&self) -> &'static str {
        match self {
            ProtocolError::EmptyRecipient | ProtocolError::MissingText => message::REPLY_BAD_FORMAT,
            ProtocolError::InvalidName(_) => message::REPLY_INVALID_NAME,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::EmptyRecipient => write!(f, "Private message without recipient"),
            ProtocolError::MissingText => write!(f, "Private message without text field"),
            ProtocolError::InvalidName(name) => write!(f, "Invalid name: {:?}", name),
        }
    }
}

impl std::error::Error for ProtocolError {}
