//! Shared test fixtures.

use driftnet_types::{TorrentSnapshot, TorrentStatus};

pub(crate) fn snapshot(id: i64, hash: &str) -> TorrentSnapshot {
    snapshot_with(id, hash, TorrentStatus::Downloading, 0, "/downloads")
}

pub(crate) fn snapshot_with(
    id: i64,
    hash: &str,
    status: TorrentStatus,
    downloaded_ever: i64,
    download_dir: &str,
) -> TorrentSnapshot {
    TorrentSnapshot {
        id,
        name: format!("torrent-{id}"),
        hash_string: hash.to_owned(),
        status,
        downloaded_ever,
        download_dir: download_dir.to_owned(),
    }
}
