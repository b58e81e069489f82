//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use dev_proxy::config::DevServerConfig;
use dev_proxy::net::TcpProbe;
use dev_proxy::routing::{ProxySpec, RuleSet, RuleSetBuilder};
use dev_proxy::{DevServer, Shutdown};

/// Headers the echo backend reports back.
const ECHOED_HEADERS: &[&str] = &[
    "host",
    "origin",
    "x-forwarded-for",
    "x-forwarded-port",
    "x-forwarded-proto",
    "x-forwarded-host",
];

/// Start a backend that answers every request with a description of it.
///
/// The body is `{name} {METHOD} {target}` followed by one `name: value`
/// line per echoed header, then the request body if any.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(echo(socket, name));
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn echo(mut socket: TcpStream, name: &'static str) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    let mut reply = format!("{name} {method} {target}\n");
    for wanted in ECHOED_HEADERS {
        for (k, v) in headers.iter().filter(|(k, _)| k == wanted) {
            reply.push_str(&format!("{k}: {v}\n"));
        }
    }
    reply.push_str(&String::from_utf8_lossy(&body));

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.len(),
        reply
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Public directory with `index.html` and `hello.txt`.
pub fn public_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>index</h1>").unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello from disk").unwrap();
    dir
}

/// Compile proxy rules the way the binary does, without an agent.
pub async fn rules(public: &Path, spec: ProxySpec) -> RuleSet {
    RuleSetBuilder::new(public)
        .normalize_loopback(false)
        .build(Some(&spec), &TcpProbe::default())
        .await
        .unwrap()
        .unwrap()
}

/// Start a dev server on an ephemeral port.
pub async fn start_dev_server(public: &Path, rules: Option<RuleSet>) -> (SocketAddr, Shutdown) {
    let mut config = DevServerConfig::default();
    config.public_dir = public.to_path_buf();
    start_configured_server(config, rules).await
}

/// Start a dev server with a caller-tuned configuration.
pub async fn start_configured_server(
    mut config: DevServerConfig,
    rules: Option<RuleSet>,
) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".into();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = DevServer::new(config, rules).unwrap();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });

    (addr, shutdown)
}

/// Test client that ignores proxy environment variables.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
