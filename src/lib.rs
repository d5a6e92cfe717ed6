//! Line-oriented TCP chat relay
//!
//! Clients connect over TCP, are registered under their remote address, and
//! exchange public and private messages through a shared hub.
//!
//! # Architecture
//!
//! ```text
//!   TcpListener ──► ChatServer::accept_loop
//!                        │ spawn per connection
//!                        ▼
//!                Connection (supervisor) ── idle timer / liveness pulse
//!                  │              │
//!          reader task        writer task ◄── inbox ◄──┐
//!                  │                                    │
//!                  ▼                                    │
//!             dispatcher ──► Registry (Mutex) ──────────┤
//!                  │                                    │
//!                  └──────► BroadcastBus ──► fan_out ───┘
//! ```
//!
//! # Wire protocol
//!
//! Plain text, one message per `\n`-terminated line:
//!
//! | Input                  | Effect                                   |
//! |------------------------|------------------------------------------|
//! | `who`                  | list online users                        |
//! | `rename\|<name>`       | change display name                      |
//! | `to\|<name>\|<text>`   | private message                          |
//! | anything else          | broadcast to every online user           |
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_relay::Result<()> {
//!     let config = ServerConfig::with_addr("127.0.0.1:8888".parse().unwrap());
//!     ChatServer::new(config).run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{OnlineEntry, Registry, RegistryError};
pub use server::{BroadcastBus, ChatServer, Hub, ServerConfig};
pub use session::{Session, SessionPhase};
pub use stats::{ServerStats, StatsSnapshot};
