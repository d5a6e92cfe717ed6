//! Server-to-client line formatting
//!
//! Lines are returned without the trailing delimiter; the session writer
//! appends it.

use std::net::SocketAddr;

/// Broadcast when a session joins
pub const NOTICE_ONLINE: &str = "is online";

/// Broadcast when a session leaves for any reason
pub const NOTICE_OFFLINE: &str = "is offline";

/// Sent to a session right before it is kicked for inactivity
pub const REPLY_KICKED: &str = "idle for too long, you have been kicked";

pub const REPLY_NAME_TAKEN: &str = "name already taken";
pub const REPLY_INVALID_NAME: &str = "invalid name";
pub const REPLY_BAD_FORMAT: &str = "invalid format, use to|name|message";
pub const REPLY_USER_NOT_FOUND: &str = "user not found";
pub const REPLY_SENT: &str = "message sent";

/// `[addr]name: text`
pub fn public_line(addr: &SocketAddr, name: &str, text: &str) -> String {
    format!("[{}]{}: {}", addr, name, text)
}

/// One entry of the `who` listing
pub fn online_line(addr: &SocketAddr, name: &str) -> String {
    public_line(addr, name, "online...")
}

/// Private message as seen by the recipient
pub fn private_line(from: &str, text: &str) -> String {
    format!("{}: {}", from, text)
}

pub fn renamed_reply(name: &str) -> String {
    format!("name updated: {}", name)
}
