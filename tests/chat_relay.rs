//! End-to-end tests over real TCP connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use chat_relay::{ChatServer, ServerConfig};

const LINE_TIMEOUT: Duration = Duration::from_secs(5);

struct Client {
    addr: SocketAddr,
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl Client {
    async fn connect(server: SocketAddr) -> Self {
        let stream = TcpStream::connect(server).await.unwrap();
        let addr = stream.local_addr().unwrap();
        let (read, write) = stream.into_split();
        let mut client = Self {
            addr,
            lines: BufReader::new(read).lines(),
            write,
        };
        // Our own join notice marks us as registered
        let own = format!("[{}]{}: is online", addr, addr);
        client.expect(|line| line == own).await;
        client
    }

    fn name(&self) -> String {
        self.addr.to_string()
    }

    async fn send(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\n").await.unwrap();
    }

    async fn next_line(&mut self) -> Option<String> {
        tokio::time::timeout(LINE_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
    }

    /// Skip lines until one matches, returning it
    async fn expect<F>(&mut self, matches: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let line = self.next_line().await.expect("connection closed");
            if matches(&line) {
                return line;
            }
        }
    }
}

async fn start_server(config: ServerConfig) -> (Arc<ChatServer>, SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(ChatServer::new(config));

    let handle = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .serve_until(listener, std::future::pending())
                .await
                .unwrap();
        })
    };

    (server, addr, handle)
}

#[tokio::test]
async fn test_who_lists_both_sessions() {
    let (_server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut one = Client::connect(addr).await;
    let two = Client::connect(addr).await;
    let two_joined = format!("[{}]{}: is online", two.addr, two.name());
    one.expect(|line| line == two_joined).await;

    one.send("who").await;

    let mut listed = vec![one.next_line().await.unwrap(), one.next_line().await.unwrap()];
    listed.sort();
    let mut expected = vec![
        format!("[{}]{}: online...", one.addr, one.name()),
        format!("[{}]{}: online...", two.addr, two.name()),
    ];
    expected.sort();
    assert_eq!(listed, expected);

    handle.abort();
}

#[tokio::test]
async fn test_rename_collision() {
    let (server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;

    b.send("rename|bob").await;
    b.expect(|line| line == "name updated: bob").await;

    a.send("rename|bob").await;
    a.expect(|line| line == "name already taken").await;

    let registry = server.hub().registry();
    assert!(registry.lookup(&a.name()).await.is_some());
    assert_eq!(registry.len().await, 2);

    handle.abort();
}

#[tokio::test]
async fn test_private_message() {
    let (server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = Client::connect(addr).await;
    let mut bob = Client::connect(addr).await;

    a.send("rename|A").await;
    a.expect(|line| line == "name updated: A").await;
    bob.send("rename|bob").await;
    bob.expect(|line| line == "name updated: bob").await;

    a.send("to|bob|hello").await;
    bob.expect(|line| line == "A: hello").await;
    a.expect(|line| line == "message sent").await;

    assert_eq!(server.stats().private_messages, 1);

    handle.abort();
}

#[tokio::test]
async fn test_unknown_recipient_reaches_nobody_else() {
    let (_server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = Client::connect(addr).await;
    let mut c = Client::connect(addr).await;

    a.send("to|ghost|hi").await;
    a.expect(|line| line == "user not found").await;

    // Anything c receives next must be the marker broadcast, not the message
    a.send("marker").await;
    let marker = format!("[{}]{}: marker", a.addr, a.name());
    let line = c.expect(|line| !line.ends_with("is online")).await;
    assert_eq!(line, marker);

    handle.abort();
}

#[tokio::test]
async fn test_broadcast_order_is_shared() {
    let (_server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;
    let b_joined = format!("[{}]{}: is online", b.addr, b.name());
    a.expect(|line| line == b_joined).await;

    for i in 0..5 {
        a.send(&format!("line {}", i)).await;
    }

    let prefix = format!("[{}]{}: line ", a.addr, a.name());
    let mut seen_a = Vec::new();
    let mut seen_b = Vec::new();
    for _ in 0..5 {
        seen_a.push(a.expect(|line| line.starts_with(&prefix)).await);
        seen_b.push(b.expect(|line| line.starts_with(&prefix)).await);
    }
    let expected: Vec<String> = (0..5).map(|i| format!("{}{}", prefix, i)).collect();
    assert_eq!(seen_a, expected);
    assert_eq!(seen_b, expected);

    handle.abort();
}

#[tokio::test]
async fn test_disconnect_broadcasts_offline() {
    let (server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = Client::connect(addr).await;
    let b = Client::connect(addr).await;
    let b_name = b.name();
    let b_addr = b.addr;
    drop(b);

    let offline = format!("[{}]{}: is offline", b_addr, b_name);
    a.expect(|line| line == offline).await;

    assert!(server.hub().registry().lookup(&b_name).await.is_none());
    assert_eq!(server.hub().registry().len().await, 1);

    handle.abort();
}

#[tokio::test]
async fn test_idle_client_is_kicked_and_closed() {
    let config = ServerConfig::default().idle_timeout(Duration::from_millis(300));
    let (server, addr, handle) = start_server(config).await;

    let mut idle = Client::connect(addr).await;

    idle.expect(|line| line == "idle for too long, you have been kicked")
        .await;
    assert_eq!(idle.next_line().await, None);

    assert!(server.hub().registry().is_empty().await);
    assert_eq!(server.stats().kicked_sessions, 1);

    handle.abort();
}

#[tokio::test]
async fn test_connection_limit() {
    let config = ServerConfig::default().max_connections(1);
    let (server, addr, handle) = start_server(config).await;

    let _first = Client::connect(addr).await;

    // The second connection is dropped without a join notice
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read, _write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let next = tokio::time::timeout(LINE_TIMEOUT, lines.next_line())
        .await
        .unwrap();
    assert!(matches!(next, Ok(None) | Err(_)));

    assert_eq!(server.stats().rejected_connections, 1);

    handle.abort();
}
