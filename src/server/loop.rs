// Server loop module
// Accepts connections until shutdown, then closes them gracefully

use hyper_util::server::graceful::GracefulShutdown;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Poll interval while waiting for connection tasks to finish
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop until `shutdown` is notified.
///
/// After shutdown the listener is closed immediately and every accepted
/// connection is told to close: idle keep-alive connections close at once,
/// busy ones after their in-flight response. The whole wait is bounded by
/// `performance.shutdown_timeout` seconds. Returns the number of
/// connections still open when the wait ended.
pub async fn run(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) -> usize {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, &graceful);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                break;
            }
        }
    }

    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    let deadline = Instant::now() + grace;

    let active = active_connections.load(Ordering::SeqCst);
    if active > 0 {
        logger::log_shutdown_draining(active, grace.as_secs());
    }

    // Resolves once every watched connection has closed
    let _ = tokio::time::timeout_at(deadline, graceful.shutdown()).await;

    let remaining = drain(&active_connections, deadline).await;
    logger::log_shutdown_complete(remaining);
    remaining
}

/// Wait until the counter reaches zero or `deadline` passes.
///
/// Connection tasks decrement the counter just after their connection
/// future resolves, so this covers the gap left by the graceful wait.
async fn drain(active_connections: &AtomicUsize, deadline: Instant) -> usize {
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn test_state(shutdown_timeout: u64) -> Arc<config::AppState> {
        let mut cfg = Config::load_from("/nonexistent/brezbaze/config").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = shutdown_timeout;
        Arc::new(config::AppState::new(&cfg))
    }

    fn spawn_server(
        shutdown_timeout: u64,
    ) -> (
        std::net::SocketAddr,
        Arc<Notify>,
        tokio::task::JoinHandle<usize>,
    ) {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let server = tokio::spawn(run(
            listener,
            test_state(shutdown_timeout),
            counter,
            Arc::clone(&shutdown),
        ));
        (addr, shutdown, server)
    }

    async fn round_trip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_any_request_until_shutdown() {
        let (addr, shutdown, server) = spawn_server(1);

        let get = round_trip(
            addr,
            "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(get.starts_with("HTTP/1.1 200 OK\r\n"), "{get}");
        assert!(get.to_ascii_lowercase().contains("content-length: 13\r\n"), "{get}");
        assert!(get.ends_with("\r\n\r\nHello World!\n"), "{get}");

        let post = round_trip(
            addr,
            "POST /anything HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\
             Connection: close\r\n\r\nhello=world",
        )
        .await;
        assert!(post.starts_with("HTTP/1.1 200 OK\r\n"), "{post}");
        assert!(post.ends_with("\r\n\r\nHello World!\n"), "{post}");

        shutdown.notify_one();
        let remaining = server.await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_head_has_length_but_no_body() {
        let (addr, shutdown, server) = spawn_server(1);

        let head = round_trip(
            addr,
            "HEAD / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "{head}");
        assert!(head.to_ascii_lowercase().contains("content-length: 13\r\n"), "{head}");
        assert!(head.ends_with("\r\n\r\n"), "{head}");
        assert!(!head.contains("Hello World!"), "{head}");

        shutdown.notify_one();
        assert_eq!(server.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_idle_keep_alive_closed_on_shutdown() {
        let (addr, shutdown, server) = spawn_server(5);

        // One request on a keep-alive connection, then leave it idle
        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.ends_with(b"Hello World!\n") {
            let n = client.read(&mut chunk).await.unwrap();
            assert_ne!(n, 0, "connection closed before the response");
            buf.extend_from_slice(&chunk[..n]);
        }

        let started = std::time::Instant::now();
        shutdown.notify_one();
        let remaining = server.await.unwrap();
        assert_eq!(remaining, 0);
        assert!(started.elapsed() < Duration::from_secs(2));

        // The server side closed the idle socket
        let mut rest = Vec::new();
        let n = client.read_to_end(&mut rest).await.unwrap_or(0);
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_at_deadline() {
        let counter = AtomicUsize::new(2);
        let deadline = Instant::now() + Duration::from_millis(120);
        assert_eq!(drain(&counter, deadline).await, 2);

        counter.store(0, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(5);
        assert_eq!(drain(&counter, deadline).await, 0);
    }
}
