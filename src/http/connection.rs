use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::fs::{FileInfo, Resolver};
use crate::http::parser::parse_http_request;
use crate::http::response::ResponseHead;
use crate::http::writer::{ResponseWriter, send_file};
use crate::server::shutdown::ShutdownSignal;

/// Default number of bytes requested from the socket per read.
pub const DEFAULT_RECV_SIZE: usize = 64 * 1024;

/// Default time a client may take to deliver one request.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-connection tunables, copied into every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Read chunk size; a read shorter than this ends the message
    pub recv_size: usize,
    /// Deadline for receiving one full message, restarted per message
    pub idle_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            recv_size: DEFAULT_RECV_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

pub struct Connection<S = TcpStream> {
    stream: S,
    peer: SocketAddr,
    resolver: Arc<Resolver>,
    settings: ConnectionSettings,
    shutdown: ShutdownSignal,
    buffer: BytesMut,
    chunk: Box<[u8]>,
    deadline: Instant,
    keep_alive: bool,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequest,
    Reading,
    Dispatching,
    Responding(Reply),
    Closing,
    Closed,
}

/// What to send for one request.
pub enum Reply {
    /// Headers only (404, 501, or 200 for HEAD)
    Head(ResponseHead),
    /// 200 for GET, body streamed from `file`
    File {
        head: ResponseHead,
        file: File,
        size: u64,
    },
}

/// How reading one message ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete message is in the buffer
    Message,
    /// The client closed its side before sending anything
    PeerClosed,
    /// The idle deadline passed
    TimedOut,
    /// The server is shutting down and no request was in progress
    Shutdown,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        resolver: Arc<Resolver>,
        settings: ConnectionSettings,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            stream,
            peer,
            resolver,
            settings,
            shutdown,
            buffer: BytesMut::with_capacity(4096),
            chunk: vec![0u8; settings.recv_size].into_boxed_slice(),
            deadline: Instant::now() + settings.idle_timeout,
            keep_alive: true,
            state: ConnectionState::AwaitRequest,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    /// Serves requests until the client leaves, times out, or asks to close.
    ///
    /// A transport error ends this connection only; the socket is closed
    /// and the error returned to the caller.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.drive().await {
            self.state = ConnectionState::Closed;
            self.close().await;
            return Err(e);
        }

        Ok(())
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitRequest => {
                    self.buffer.clear();
                    self.deadline = Instant::now() + self.settings.idle_timeout;
                    self.state = ConnectionState::Reading;
                }

                ConnectionState::Reading => {
                    self.state = match self.read_message().await? {
                        ReadOutcome::Message => ConnectionState::Dispatching,
                        ReadOutcome::PeerClosed => {
                            debug!(peer = %self.peer, "Client closed the connection");
                            ConnectionState::Closing
                        }
                        ReadOutcome::TimedOut => {
                            debug!(peer = %self.peer, "Connection timed out");
                            ConnectionState::Closing
                        }
                        ReadOutcome::Shutdown => {
                            debug!(peer = %self.peer, "Closing idle connection for shutdown");
                            ConnectionState::Closing
                        }
                    };
                }

                ConnectionState::Dispatching => {
                    let reply = self.dispatch().await;
                    self.state = ConnectionState::Responding(reply);
                }

                ConnectionState::Responding(reply) => {
                    self.respond(reply).await?;

                    self.state = if self.keep_alive && !self.shutdown.is_triggered() {
                        ConnectionState::AwaitRequest
                    } else {
                        ConnectionState::Closing
                    };
                }

                ConnectionState::Closing => {
                    self.close().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    self.state = ConnectionState::Closed;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads one message into the buffer.
    ///
    /// Messages are framed by short reads: a read returning fewer bytes than
    /// the chunk size ends the message. Requests carry no body, so this is
    /// enough. Shutdown only interrupts the wait for the first bytes.
    pub async fn read_message(&mut self) -> anyhow::Result<ReadOutcome> {
        let Self {
            stream,
            buffer,
            chunk,
            shutdown,
            deadline,
            ..
        } = self;

        let mut first = true;

        loop {
            let read = timeout_at(*deadline, stream.read(&mut chunk[..]));

            let result = if first {
                // Bytes already waiting win over shutdown
                tokio::select! {
                    biased;
                    r = read => r,
                    _ = shutdown.triggered() => return Ok(ReadOutcome::Shutdown),
                }
            } else {
                read.await
            };

            let n = match result {
                Ok(r) => r?,
                Err(_elapsed) => return Ok(ReadOutcome::TimedOut),
            };

            if n == 0 {
                // EOF right after a full-sized read still completes the message
                return Ok(if buffer.is_empty() {
                    ReadOutcome::PeerClosed
                } else {
                    ReadOutcome::Message
                });
            }

            buffer.extend_from_slice(&chunk[..n]);

            if n < chunk.len() {
                return Ok(ReadOutcome::Message);
            }

            first = false;
        }
    }

    async fn dispatch(&mut self) -> Reply {
        let request = {
            let text = String::from_utf8_lossy(&self.buffer);
            debug!(peer = %self.peer, bytes = self.buffer.len(), "Received request");
            debug!("Message contents:\n{}", text);
            parse_http_request(&text)
        };

        self.keep_alive = request.keep_alive;
        let keep_alive = request.keep_alive;

        // The buffer is never empty here, so no path means an unsupported request
        let Some(path) = request.path.as_deref() else {
            return Reply::Head(ResponseHead::not_implemented(keep_alive));
        };

        let Some(info) = self.resolver.resolve(path).await else {
            return Reply::Head(ResponseHead::not_found(keep_alive));
        };

        if request.is_head() {
            return Reply::Head(ResponseHead::ok(&info, keep_alive));
        }

        self.open_file(info, keep_alive).await
    }

    /// Opens a resolved file for streaming, falling back to 404 if it has
    /// gone missing or is unreadable since it was resolved.
    async fn open_file(&self, info: FileInfo, keep_alive: bool) -> Reply {
        let head = ResponseHead::ok(&info, keep_alive);

        match File::open(&info.path).await {
            Ok(file) => Reply::File {
                head,
                file,
                size: info.size,
            },
            Err(e) => {
                warn!(
                    peer = %self.peer,
                    path = %info.path.display(),
                    error = %e,
                    "Resolved file could not be opened"
                );
                Reply::Head(ResponseHead::not_found(keep_alive))
            }
        }
    }

    async fn respond(&mut self, reply: Reply) -> anyhow::Result<()> {
        match reply {
            Reply::Head(head) => {
                ResponseWriter::head_only(&head)
                    .write_to_stream(&mut self.stream)
                    .await?;

                debug!(
                    peer = %self.peer,
                    status = head.status.as_u16(),
                    keep_alive = head.keep_alive,
                    "Response sent"
                );
            }

            Reply::File { head, file, size } => {
                let sent = send_file(&mut self.stream, &head, file, size).await?;

                debug!(
                    peer = %self.peer,
                    status = head.status.as_u16(),
                    keep_alive = head.keep_alive,
                    bytes = sent,
                    "Response sent"
                );
            }
        }

        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            warn!(peer = %self.peer, error = %e, "Unable to close socket");
        }

        debug!(peer = %self.peer, "Closed connection");
    }
}
