//! Mini-app webhook daemon.
//!
//! Receives signed lifecycle events from the host and keeps per-user
//! notification details in the configured store.
//!
//! Run:
//!   miniapp-daemon --config daemon.toml
//!   miniapp-daemon --bind 0.0.0.0:8787
//!
//! Then:
//!   curl localhost:8787/health

mod config;
mod server;

use clap::Parser;
use config::Config;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "miniapp-daemon", version, about = "Mini-app webhook daemon")]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "MINIAPP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding `[server] bind`.
    #[arg(long, env = "MINIAPP_BIND")]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("miniapp_daemon=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    server::run(config).await
}
