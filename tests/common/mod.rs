//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use failover_proxy::config::{OriginConfig, ProxyConfig};
use failover_proxy::http::HttpServer;
use failover_proxy::lifecycle::Shutdown;
use failover_proxy::store::MemoryKvStore;

/// Start a simple mock origin that returns a fixed 200 response.
pub async fn start_mock_origin(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a programmable mock origin with async support.
#[allow(dead_code)]
pub async fn start_programmable_origin<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start an origin that accepts connections but never answers. Each
/// accepted socket is parked so the proxy only gives up via its own
/// attempt timeout.
#[allow(dead_code)]
pub async fn start_hung_origin(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let _held = socket;
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Origin config entry pointing at a local mock.
pub fn origin(id: &str, addr: SocketAddr, tier: u32) -> OriginConfig {
    OriginConfig {
        id: id.to_string(),
        label: id.to_string(),
        url: format!("http://{}", addr),
        health_path: "/health".to_string(),
        tier,
    }
}

/// Proxy config with probing disabled so tests control health state
/// directly through the store.
#[allow(dead_code)]
pub fn proxy_config(bind: SocketAddr, origins: Vec<OriginConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = bind.to_string();
    config.origins = origins;
    config.probe.enabled = false;
    // Keep failing attempts fast
    config.timeouts.upstream_secs = 2;
    config
}

/// Boot the proxy against a shared store; returns the shutdown handle.
#[allow(dead_code)]
pub async fn spawn_proxy(config: ProxyConfig, kv: Arc<MemoryKvStore>) -> Shutdown {
    let bind: SocketAddr = config.listener.bind_address.parse().unwrap();
    let server = HttpServer::with_store(config, kv).unwrap();

    let shutdown = Shutdown::new();
    let server_rx = shutdown.subscribe();
    let prober_rx = shutdown.subscribe();
    let listener = TcpListener::bind(bind).await.unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, server_rx, prober_rx).await;
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown
}

/// Poll until `check` passes or the deadline elapses.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(check: F, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    check()
}

/// Non-pooled client so mock connection-close behavior stays deterministic.
#[allow(dead_code)]
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
