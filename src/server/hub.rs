//! Shared server context
//!
//! The hub bundles everything a connection needs to reach the rest of the
//! server. It is built once per server and handed to each connection as an
//! `Arc<Hub>`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::bus::BroadcastBus;
use super::config::ServerConfig;
use crate::error::Result;
use crate::protocol::message;
use crate::registry::{Registry, RegistryError};
use crate::session::{InboxReceiver, Session};
use crate::stats::ServerStats;

pub struct Hub {
    config: ServerConfig,
    registry: Arc<Registry>,
    bus: Arc<BroadcastBus>,
    stats: Arc<ServerStats>,
}

impl Hub {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let registry = Arc::new(Registry::new());
        let bus = Arc::new(BroadcastBus::new(
            Arc::clone(&registry),
            config.broadcast_capacity,
        ));

        Arc::new(Self {
            config,
            registry,
            bus,
            stats: Arc::new(ServerStats::new()),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<BroadcastBus> {
        &self.bus
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Start the broadcast consumer
    pub fn spawn_broadcast_task(&self) -> JoinHandle<()> {
        self.bus.spawn_consumer()
    }

    /// Create a session with this server's inbox settings
    pub fn new_session(&self, id: u64, peer_addr: SocketAddr) -> (Arc<Session>, InboxReceiver) {
        Session::new(id, peer_addr, self.config.inbox_capacity)
    }

    /// Format `text` as a public line from `session` and queue it on the bus
    ///
    /// The name is read under the registry lock; a rename racing with the
    /// publish is not reflected in an already-queued line.
    pub async fn broadcast_from(&self, session: &Session, text: &str) -> Result<()> {
        let name = self
            .registry
            .name_of(session)
            .await
            .ok_or(RegistryError::NotOnline(session.id()))?;

        self.bus
            .publish(message::public_line(&session.peer_addr(), &name, text))
            .await;
        self.stats.broadcast();
        Ok(())
    }
}
