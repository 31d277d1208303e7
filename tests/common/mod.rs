//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fileserve::config::Config;
use fileserve::server::Listener;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

static NEXT_SITE: AtomicUsize = AtomicUsize::new(0);

/// A throwaway base directory, removed on drop.
pub struct TempSite {
    root: PathBuf,
}

impl TempSite {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!(
            "fileserve-test-{}-{}",
            std::process::id(),
            NEXT_SITE.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempSite {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Deterministic, non-repeating-looking test content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

pub fn test_config(base: &Path) -> Config {
    Config {
        base_dir: base.to_path_buf(),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        recv_size: 64 * 1024,
        idle_timeout: Duration::from_secs(30),
        verbose: false,
    }
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(cfg: Config) -> Self {
        let listener = Listener::bind(&cfg).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(listener.serve(async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            stop: Some(tx),
            handle,
        }
    }

    /// Signals shutdown and returns the handle so callers can await it.
    pub fn stop(mut self) -> JoinHandle<anyhow::Result<()>> {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        self.handle
    }
}

#[derive(Debug)]
pub struct ParsedResponse {
    pub status: u16,
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ParsedResponse {
    /// Last value of the header, mirroring how clients resolve duplicates.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").map(|v| v.parse().unwrap())
    }
}

/// Reads one response. HEAD responses advertise a length but carry no body.
pub async fn read_response<R>(reader: &mut R, head_request: bool) -> ParsedResponse
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = reader.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response head was complete");
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap().to_string();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let headers: Vec<(String, String)> = lines
        .map(|l| {
            let (k, v) = l.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    let mut response = ParsedResponse {
        status,
        status_line,
        headers,
        body: buf[head_end + 4..].to_vec(),
    };

    let expected = if head_request {
        0
    } else {
        response.content_length().unwrap_or(0)
    };

    while response.body.len() < expected {
        let n = reader.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        response.body.extend_from_slice(&chunk[..n]);
    }

    response
}

/// True if the peer closes without sending anything further.
pub async fn closed_without_data<R>(reader: &mut R) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 64];
    match tokio::time::timeout(Duration::from_secs(5), reader.read(&mut chunk)).await {
        Ok(Ok(0)) => true,
        Ok(Err(_)) => true,
        _ => false,
    }
}
