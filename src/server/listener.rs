//! Chat server listener
//!
//! Handles the TCP accept loop and spawns a supervisor per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::hub::Hub;
use crate::stats::StatsSnapshot;

/// Chat server
pub struct ChatServer {
    config: ServerConfig,
    hub: Arc<Hub>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl ChatServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            hub: Hub::new(config.clone()),
            config,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get the shared hub (registry, bus, stats)
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Current server statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.hub.stats().snapshot()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown).await
    }

    /// Accept connections on an already bound listener until `shutdown`
    /// resolves
    ///
    /// Sessions that are still connected at shutdown are left to finish on
    /// their own.
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = %listener.local_addr()?, "Chat server listening");

        let broadcast_handle = self.hub.spawn_broadcast_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        // Stop the broadcast consumer on shutdown
        broadcast_handle.abort();

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    // Transient: keep listening
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    self.hub.stats().connection_rejected();
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.hub.stats().connection_accepted();

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let hub = Arc::clone(&self.hub);

        tokio::spawn(async move {
            // Held until the session is torn down
            let _permit = permit;
            let connection = Connection::new(session_id, socket, peer_addr, hub);

            match connection.run().await {
                Ok(termination) => {
                    tracing::debug!(
                        session_id = session_id,
                        termination = ?termination,
                        "Connection closed"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = session_id,
                        error = %e,
                        "Connection error"
                    );
                }
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}
