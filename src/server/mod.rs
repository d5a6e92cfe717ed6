//! Chat server
//!
//! Listener, per-connection supervisor, broadcast bus and the shared hub
//! that ties them together.

pub mod bus;
pub mod config;
pub mod connection;
pub mod hub;
pub mod listener;

pub use bus::BroadcastBus;
pub use config::ServerConfig;
pub use connection::{Connection, Termination};
pub use hub::Hub;
pub use listener::ChatServer;
