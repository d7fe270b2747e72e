//! # Driftnet RPC
//!
//! Transport and method wrappers for the Transmission RPC protocol: one thin
//! call per remote method, HTTP basic auth and session id negotiation, and a
//! mockable [`Transport`] seam underneath.
//!
//! usage:
//!
//! ```rust,ignore
//! use driftnet_rpc::RpcClient;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = Url::parse("http://localhost:9091/transmission/rpc")?;
//!     let client = RpcClient::with_auth(url, "transmission", "123456");
//!     for torrent in client.torrent_snapshots().await? {
//!         println!("{}: {} bytes", torrent.name, torrent.downloaded_ever);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod transport;

#[cfg(test)]
mod testutil;

pub use client::{
    AddedTorrent, RpcClient, SessionMutator, SessionStats, StatsDetails, TorrentId, WATCH_FIELDS,
};
pub use transport::{HttpTransport, Transport};
