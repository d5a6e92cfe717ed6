//! Client command parsing
//!
//! Matching is exact and case-sensitive. `|` is never escaped: names may not
//! contain it, while private message text is everything after the second
//! delimiter and may contain it freely.

use super::constants::{CMD_PRIVATE_PREFIX, CMD_RENAME_PREFIX, CMD_WHO, FIELD_DELIMITER};
use super::error::ProtocolError;

/// A parsed client line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `who`
    Who,
    /// `rename|<name>`
    Rename(&'a str),
    /// `to|<recipient>|<text>`
    Private { to: &'a str, text: &'a str },
    /// Any other line
    Broadcast(&'a str),
}

impl<'a> Command<'a> {
    /// Parse a single line with its delimiter already stripped
    pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
        if line == CMD_WHO {
            return Ok(Command::Who);
        }

        if let Some(name) = line.strip_prefix(CMD_RENAME_PREFIX) {
            validate_name(name)?;
            return Ok(Command::Rename(name));
        }

        if let Some(rest) = line.strip_prefix(CMD_PRIVATE_PREFIX) {
            let (to, text) = rest
                .split_once(FIELD_DELIMITER)
                .ok_or(ProtocolError::MissingText)?;
            if to.is_empty() {
                return Err(ProtocolError::EmptyRecipient);
            }
            return Ok(Command::Private { to, text });
        }

        Ok(Command::Broadcast(line))
    }
}

/// Check that a display name is usable as a registry key
pub fn validate_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() || name.contains(FIELD_DELIMITER) {
        return Err(ProtocolError::InvalidName(name.to_string()));
    }
    Ok(())
}
