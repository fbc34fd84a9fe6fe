//! End-to-end tests over loopback sockets.

use lantern::app;
use lantern::config::Config;
use lantern::server::Server;
use lantern::static_files::StaticResolver;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    server: Arc<Server>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<()>>,
    _root: TempDir,
}

impl Running {
    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.task.await.unwrap().unwrap();
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.idle_timeout_seconds = 1;
    config.server.backlog = 64;
    config
}

async fn start(config: Config) -> Running {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), "Hello").unwrap();
    let statics = StaticResolver::new(root.path()).unwrap();

    let server = Arc::new(Server::with_statics(
        config,
        app::router().unwrap(),
        Some(statics),
    ));
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let task = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = stopped.await;
                })
                .await
        })
    };

    Running {
        addr,
        server,
        stop,
        task,
        _root: root,
    }
}

async fn send(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

fn status_of(response: &str) -> u16 {
    response
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn body_of(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}

#[tokio::test]
async fn test_serves_static_and_routes() {
    let running = start(test_config()).await;

    let response = send(running.addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 5\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert_eq!(body_of(&response), "Hello");

    let response = send(running.addr, b"GET /user/42 HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&response), 200);
    assert!(body_of(&response).contains("42"));

    let response = send(running.addr, b"GET /does-not-exist HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&response), 404);

    let response = send(running.addr, b"GET /../../etc/passwd HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&response), 404);

    running.shutdown().await;
}

#[tokio::test]
async fn test_rejects_bad_requests() {
    let running = start(test_config()).await;

    let response = send(running.addr, b"POST /echo HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert_eq!(status_of(&response), 400);
    assert!(response.contains("Connection: close\r\n"));

    let response = send(running.addr, b"NONSENSE\r\n\r\n").await;
    assert_eq!(status_of(&response), 400);

    running.shutdown().await;
}

#[tokio::test]
async fn test_post_body_reaches_handler() {
    let running = start(test_config()).await;

    let body = "greeting=hi";
    let raw = format!(
        "POST /echo HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send(running.addr, raw.as_bytes()).await;

    assert_eq!(status_of(&response), 200);
    assert!(body_of(&response).contains("<li>greeting: hi</li>"));

    running.shutdown().await;
}

#[tokio::test]
async fn test_slow_client_times_out() {
    let running = start(test_config()).await;

    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert_eq!(status_of(&String::from_utf8_lossy(&out)), 408);

    running.shutdown().await;
}

#[tokio::test]
async fn test_oversized_headers_rejected() {
    let mut config = test_config();
    config.server.max_header_bytes = 256;
    let running = start(config).await;

    // Small enough to arrive in one read, so nothing is left unread.
    let raw = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(1000));
    let response = send(running.addr, raw.as_bytes()).await;
    assert_eq!(status_of(&response), 400);

    running.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_clients_are_independent() {
    let running = start(test_config()).await;
    let addr = running.addr;

    // Hold a stalled connection open; it must not block the others.
    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled.write_all(b"GET /user/").await.unwrap();

    let clients: Vec<_> = (0..20)
        .map(|i| {
            tokio::spawn(async move {
                let raw = format!("GET /user/{} HTTP/1.1\r\n\r\n", i);
                (i, send(addr, raw.as_bytes()).await)
            })
        })
        .collect();

    for client in clients {
        let (i, response) = client.await.unwrap();
        assert_eq!(status_of(&response), 200);
        assert!(body_of(&response).contains(&format!("User {}</p>", i)));
    }

    drop(stalled);
    assert!(running.server.connection_count() >= 21);
    running.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let running = start(test_config()).await;
    let addr = running.addr;

    let response = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&response), 200);

    running.shutdown().await;
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_bind_fails_when_port_taken() {
    let running = start(test_config()).await;

    let mut config = test_config();
    config.server.port = running.addr.port();
    let second = Server::with_statics(config, app::router().unwrap(), None);
    assert!(second.bind().await.is_err());

    running.shutdown().await;
}

#[test]
fn test_new_requires_static_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.static_files.root = dir.path().join("missing");

    assert!(Server::new(config, app::router().unwrap()).is_err());
}
