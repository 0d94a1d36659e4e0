//! Minimal HTTP/1.1 responder for exercising real network code in tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TestResponse {
    status: u16,
    delay: Duration,
}

impl TestResponse {
    pub(crate) fn status(status: u16) -> Self {
        Self { status, delay: Duration::ZERO }
    }

    pub(crate) fn delayed(status: u16, delay: Duration) -> Self {
        Self { status, delay }
    }
}

/// Answers every request with the same canned response and records the raw
/// request text.
pub(crate) struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    accept_loop: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn start(response: TestResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let _ = serve(stream, response, seen).await;
                });
            }
        });

        Self { addr, requests, accept_loop }
    }

    /// `host:port`, suitable as a check url
    pub(crate) fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// An address nothing is listening on
pub(crate) async fn unused_authority() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
    let addr = listener.local_addr().expect("probe port address");
    drop(listener);
    addr.to_string()
}

async fn serve(
    mut stream: TcpStream,
    response: TestResponse,
    seen: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if request_complete(&buf) {
            break;
        }
    }
    seen.lock().await.push(String::from_utf8_lossy(&buf).into_owned());

    tokio::time::sleep(response.delay).await;
    let head = format!(
        "HTTP/1.1 {} Test\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        response.status
    );
    stream.write_all(head.as_bytes()).await?;
    stream.shutdown().await
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    buf.len() >= header_end + 4 + body_len
}
