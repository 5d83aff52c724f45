//! Shared utilities for proxy integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use caching_proxy::{proxy, Config, Listener, ProxyState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// A local origin server that records every request it receives.
pub struct Origin {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl Origin {
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

/// Read from the socket until the end of the request headers.
async fn read_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    head
}

/// Start an origin that answers every request with `200 OK` and `body`.
pub async fn start_origin(body: Vec<u8>) -> Origin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let body = Arc::new(body);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                recorded
                    .lock()
                    .await
                    .push(String::from_utf8_lossy(&head).into_owned());
                let mut response = format!(
                    "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
                    body.len()
                )
                .into_bytes();
                response.extend_from_slice(&body);
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Origin { addr, requests }
}

/// Start an origin that reads the request and then never answers.
pub async fn start_stalled_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_head(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: Config) -> (SocketAddr, ProxyState) {
    let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), config.max_connections)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ProxyState::from_config(&config);

    let serving = state.clone();
    tokio::spawn(async move {
        let _ = proxy::serve(listener, serving, std::future::pending()).await;
    });

    (addr, state)
}

/// Send raw bytes to the proxy and read until it closes the connection.
pub async fn send(proxy: SocketAddr, raw: &str) -> Vec<u8> {
    let mut client = TcpStream::connect(proxy).await.unwrap();
    client.write_all(raw.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    response
}

/// Request line plus a typical browser header block.
pub fn get_request(url: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: ignored\r\nUser-Agent: test-client\r\nConnection: keep-alive\r\n\r\n",
        url
    )
}
