//! Shared test fixtures.

use serde_json::{Value, json};

/// A `torrent-get` record shaped like the daemon's wire output.
pub(crate) fn torrent_record(
    id: i64,
    name: &str,
    hash: &str,
    status: i64,
    downloaded_ever: i64,
    download_dir: &str,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "hashString": hash,
        "status": status,
        "downloadedEver": downloaded_ever,
        "downloadDir": download_dir,
    })
}
