//! Chat relay server
//!
//! Run with: cargo run --example chat_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example chat_server                    # binds to 0.0.0.0:8888
//!   cargo run --example chat_server localhost          # binds to 127.0.0.1:8888
//!   cargo run --example chat_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!
//! ## Connecting
//!
//!   nc localhost 8888
//!
//! ## Commands
//!
//!   who                  list online users
//!   rename|<name>        change your display name
//!   to|<name>|<text>     private message
//!   anything else        broadcast to everyone
//!
//! Sessions with no input for 120 seconds are kicked.

use std::net::SocketAddr;
use std::time::Duration;

use chat_relay::protocol::constants::DEFAULT_PORT;
use chat_relay::{ChatServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8888
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8888
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: chat_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_relay=debug".parse()?)
                .add_directive("chat_server=debug".parse()?),
        )
        .init();

    let server = ChatServer::new(config);
    let hub = std::sync::Arc::clone(server.hub());

    // Periodic stats line
    let stats_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let stats = hub.stats().snapshot();
            tracing::info!(
                online = stats.active_sessions,
                connections = stats.total_connections,
                broadcasts = stats.broadcasts,
                private = stats.private_messages,
                kicked = stats.kicked_sessions,
                "Stats"
            );
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        eprintln!("Server error: {}", e);
    }

    stats_task.abort();
    Ok(())
}
