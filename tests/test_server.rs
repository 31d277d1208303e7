mod common;

use std::time::Duration;

use common::{TempSite, TestServer, closed_without_data, pattern, read_response, test_config};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_serves_index_over_tcp() {
    let site = TempSite::new();
    site.write("index.html", b"hello world\n");
    let server = TestServer::start(test_config(site.path())).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream, false).await;
    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.content_length(), Some(12));
    assert_eq!(resp.header("Content-Type"), Some("text/html"));
    assert_eq!(resp.body, b"hello world\n");
    assert!(closed_without_data(&mut stream).await);

    server.stop().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_client_does_not_block_others() {
    let site = TempSite::new();
    site.write("a.txt", b"alpha");
    let server = TestServer::start(test_config(site.path())).await;

    // Connected but silent
    let _idle = TcpStream::connect(server.addr).await.unwrap();

    let mut busy = TcpStream::connect(server.addr).await.unwrap();
    busy.write_all(b"GET /a.txt HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let resp = tokio::time::timeout(Duration::from_secs(5), read_response(&mut busy, false))
        .await
        .expect("second client was blocked");
    assert_eq!(resp.body, b"alpha");

    server.stop().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_many_concurrent_clients() {
    let site = TempSite::new();
    let body = pattern(20_000);
    site.write("data.bin", &body);
    let server = TestServer::start(test_config(site.path())).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            for _ in 0..3 {
                stream
                    .write_all(b"GET /data.bin HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
                    .await
                    .unwrap();
                let resp = read_response(&mut stream, false).await;
                assert_eq!(resp.status, 200);
                assert_eq!(resp.body.len(), 20_000);
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    server.stop().await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_idle_keep_alive_connections() {
    let site = TempSite::new();
    site.write("a.txt", b"alpha");
    let server = TestServer::start(test_config(site.path())).await;
    let addr = server.addr;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /a.txt HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();
    assert_eq!(read_response(&mut stream, false).await.status, 200);

    let stopped = server.stop();
    tokio::time::timeout(Duration::from_secs(5), stopped)
        .await
        .expect("server did not drain")
        .unwrap()
        .unwrap();

    assert!(closed_without_data(&mut stream).await);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_response_finish() {
    let site = TempSite::new();
    let body = pattern(4 * 1024 * 1024);
    site.write("big.bin", &body);
    let server = TestServer::start(test_config(site.path())).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /big.bin HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();

    // Wait for the transfer to start before stopping
    let mut first = [0u8; 16];
    stream.read_exact(&mut first).await.unwrap();
    assert_eq!(&first, b"HTTP/1.1 200 OK\r");

    let stopped = server.stop();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    let head_end = rest.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    assert_eq!(&rest[head_end + 4..], &body[..]);

    stopped.await.unwrap().unwrap();
}
