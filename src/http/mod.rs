//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: GET and HEAD for static files,
//! keep-alive connections, no request bodies.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection request/response state machine
//! - **`parser`**: Turns one framed message into a [`request::Request`]
//! - **`request`**: Request representation and path normalization
//! - **`response`**: Status codes and the fixed-order response head
//! - **`writer`**: Writes heads and streams file bodies to the socket
//! - **`mime`**: Content-Type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │   AwaitRequest   │ ← Restart the idle deadline
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Reading      │ ← Read until a short read
//!        └──────┬───────────┘
//!               │ Message received      (timeout / peer close → Closing)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Parse, resolve file, pick 200/404/501
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Responding    │ ← Write head, stream file for GET
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → AwaitRequest (same connection)
//!               └─ Close → Closing → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fileserve::fs::Resolver;
//! use fileserve::http::connection::{Connection, ConnectionSettings};
//! use fileserve::server::Shutdown;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let resolver = Arc::new(Resolver::new("./site"));
//!     let shutdown = Shutdown::new();
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let mut conn = Connection::new(
//!             socket,
//!             peer,
//!             resolver.clone(),
//!             ConnectionSettings::default(),
//!             shutdown.subscribe(),
//!         );
//!         tokio::spawn(async move {
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
