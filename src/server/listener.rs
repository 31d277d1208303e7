use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::fs::Resolver;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::server::shutdown::Shutdown;

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections and runs one handler task per connection.
pub struct Listener {
    listener: TcpListener,
    resolver: Arc<Resolver>,
    settings: ConnectionSettings,
}

impl Listener {
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(cfg.listen_addr()).await?;

        Ok(Self {
            listener,
            resolver: Arc::new(Resolver::new(cfg.base_dir.clone())),
            settings: cfg.connection_settings(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `signal` resolves, then drains.
    ///
    /// After the signal the listening socket is closed, idle handlers are
    /// told to close, and handlers in the middle of a request finish their
    /// response first. Returns once every handler has exited.
    pub async fn serve<F>(self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            resolver,
            settings,
        } = self;

        let shutdown = Shutdown::new();
        let mut handlers = JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received");
                    break;
                }

                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "Unable to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };

                    debug!(peer = %peer, "Accepted connection");

                    let mut conn = Connection::new(
                        socket,
                        peer,
                        Arc::clone(&resolver),
                        settings,
                        shutdown.subscribe(),
                    );

                    handlers.spawn(async move {
                        if let Err(e) = conn.run().await {
                            error!(peer = %peer, error = %e, "Connection error");
                        }
                    });
                }

                Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                    log_join(joined);
                }
            }
        }

        drop(listener);
        shutdown.trigger();

        info!(active = handlers.len(), "Finishing open connections");

        while let Some(joined) = handlers.join_next().await {
            log_join(joined);
        }

        info!("All connections closed");
        Ok(())
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "Connection task failed");
    }
}

/// Binds the configured address and serves until Ctrl+C.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = Listener::bind(cfg).await?;
    info!(
        addr = %listener.local_addr()?,
        base = %cfg.base_dir.display(),
        "Listening"
    );

    listener.serve(ctrl_c()).await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Unable to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
