//! # Driftnet CLI
//!
//! Watches a Transmission daemon and logs every torrent lifecycle event.
//!
//! ## Usage
//!
//! ```sh,ignore
//! driftnet --url http://localhost:9091/transmission/rpc --username t --password secret
//! ```

use std::time::Duration;

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use driftnet_rpc::RpcClient;
use driftnet_types::EventKind;
use driftnet_watch::{HandlerRegistry, Watcher};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Transmission RPC endpoint.
    #[arg(long, default_value = "http://localhost:9091/transmission/rpc")]
    url: String,

    /// RPC username, if the daemon requires authentication.
    #[arg(long)]
    username: Option<String>,

    /// RPC password.
    #[arg(long)]
    password: Option<String>,

    /// Poll period in seconds.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    period: u64,
}

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds a registry logging every event kind and every skipped poll.
fn logging_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for kind in EventKind::ALL {
        registry.on(kind, move |event| {
            let torrent = event.snapshot();
            info!(
                ?kind,
                name = %torrent.name,
                hash = %torrent.hash_string,
                downloaded = torrent.downloaded_ever,
                dir = %torrent.download_dir,
                "torrent event"
            );
        });
    }
    registry.on_error(|err| error!(%err, "poll failed"));
    registry
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let url = Url::parse(&cli.url)?;
    let client = match (cli.username, cli.password) {
        (Some(username), Some(password)) => RpcClient::with_auth(url, username, password),
        _ => RpcClient::new(url),
    };

    let watcher = Watcher::with_period(client, Duration::from_secs(cli.period));
    watcher.start(logging_registry());
    info!("watching {}", cli.url);

    // Run until asked to stop.
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }

    info!("shutting down");
    watcher.stop().await;
    Ok(())
}
