//! The snapshot fetcher seam between the watcher and the RPC client.

use async_trait::async_trait;

use driftnet_rpc::{RpcClient, Transport};
use driftnet_types::{RpcError, TorrentSnapshot};

/// One "list torrents" poll, yielding the watched field set for every
/// torrent the daemon knows about.
///
/// Implemented for [`RpcClient`]; tests substitute mocks or scripted
/// sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Fetches the current snapshot of every torrent.
    async fn fetch(&self) -> Result<Vec<TorrentSnapshot>, RpcError>;
}

#[async_trait]
impl<T: Transport> TorrentSource for RpcClient<T> {
    async fn fetch(&self) -> Result<Vec<TorrentSnapshot>, RpcError> {
        self.torrent_snapshots().await
    }
}
