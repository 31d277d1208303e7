use clap::Parser;
use tracing::Level;

use fileserve::config::{Cli, Config};
use fileserve::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cfg.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    server::run(&cfg).await
}
