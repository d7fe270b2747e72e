//! # Driftnet Watch
//!
//! Turns Transmission's stateless "list torrents" RPC into a stream of
//! lifecycle events by polling on a fixed period and diffing consecutive
//! snapshots: added, deleted, moved, progress, and one event per status
//! transition.
//!
//! usage:
//!
//! ```rust,ignore
//! use driftnet_rpc::RpcClient;
//! use driftnet_types::EventKind;
//! use driftnet_watch::{HandlerRegistry, Watcher};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = Url::parse("http://localhost:9091/transmission/rpc")?;
//!     let client = RpcClient::new(url);
//!
//!     let mut registry = HandlerRegistry::new();
//!     registry.on(EventKind::Added, |event| {
//!         println!("new torrent: {}", event.snapshot().name);
//!     });
//!     registry.on(EventKind::Seeded, |event| {
//!         println!("done: {}", event.snapshot().name);
//!     });
//!
//!     let watcher = Watcher::new(client);
//!     watcher.start(registry);
//!     tokio::signal::ctrl_c().await?;
//!     watcher.stop().await;
//!     Ok(())
//! }
//! ```

mod diff;
mod dispatch;
mod snapshot;
mod source;
mod watcher;

#[cfg(test)]
mod testutil;

pub use diff::diff;
pub use dispatch::{ErrorHandler, EventHandler, HandlerRegistry};
pub use snapshot::SnapshotSet;
pub use source::TorrentSource;
pub use watcher::{DEFAULT_POLL_PERIOD, Watcher};
