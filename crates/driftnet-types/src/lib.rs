//! # Driftnet Types
//!
//! Shared data model for the Driftnet Transmission RPC client: the torrent
//! snapshot fetched on every poll, the lifecycle events derived from
//! consecutive snapshots, and the error taxonomy for RPC calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for RPC operations.
///
/// None of these are fatal to a polling loop: a failed call skips the poll
/// and the next tick retries.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Network-related errors (connection failures, timeouts, etc.)
    #[error("network error: {0}")]
    Network(String),

    /// The daemon answered 401; the caller may need to re-authenticate.
    #[error("authentication required")]
    Unauthorized,

    /// Well-formed response carrying an error (non-success HTTP status or a
    /// non-"success" RPC result).
    #[error("server error: {0}")]
    Server(String),

    /// Response body is not valid JSON or does not match the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Torrent activity as reported by the daemon, one variant per wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TorrentStatus {
    /// Torrent is stopped (code 0).
    Stopped,
    /// Queued to check files (code 1).
    CheckWait,
    /// Checking files (code 2).
    Checking,
    /// Queued to download (code 3).
    DownloadWait,
    /// Downloading (code 4).
    Downloading,
    /// Queued to seed (code 5).
    SeedWait,
    /// Seeding (code 6).
    Seeding,
}

impl TorrentStatus {
    /// The numeric code used on the wire.
    pub const fn code(self) -> i64 {
        match self {
            Self::Stopped => 0,
            Self::CheckWait => 1,
            Self::Checking => 2,
            Self::DownloadWait => 3,
            Self::Downloading => 4,
            Self::SeedWait => 5,
            Self::Seeding => 6,
        }
    }
}

impl TryFrom<i64> for TorrentStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Stopped),
            1 => Ok(Self::CheckWait),
            2 => Ok(Self::Checking),
            3 => Ok(Self::DownloadWait),
            4 => Ok(Self::Downloading),
            5 => Ok(Self::SeedWait),
            6 => Ok(Self::Seeding),
            other => Err(format!("unknown torrent status code {other}")),
        }
    }
}

impl From<TorrentStatus> for i64 {
    fn from(status: TorrentStatus) -> Self {
        status.code()
    }
}

/// A single point-in-time record of one torrent's watched fields.
///
/// `hash_string` is the sole identity key: the same hash across two polls is
/// the same torrent, whatever happened to its numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentSnapshot {
    /// Daemon-assigned numeric id. Not stable across daemon restarts.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Info hash, the identity key across polls.
    pub hash_string: String,

    /// Current activity.
    pub status: TorrentStatus,

    /// Total bytes downloaded for this torrent, monotonic.
    pub downloaded_ever: i64,

    /// Directory the torrent's data lives in.
    pub download_dir: String,
}

/// Discriminant of a [`LifecycleEvent`], used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Torrent appeared since the previous poll.
    Added,
    /// Torrent vanished since the previous poll.
    Deleted,
    /// Download directory changed.
    Moved,
    /// Status became stopped.
    Stopped,
    /// Status became check-wait.
    CheckWait,
    /// Status became checking.
    Checked,
    /// Status became download-wait.
    StartWait,
    /// Status became downloading.
    Started,
    /// Status became seed-wait.
    SeedWait,
    /// Status became seeding.
    Seeded,
    /// Downloaded byte count changed.
    Progress,
    /// Torrent was already present on the first completed poll.
    Exists,
}

impl EventKind {
    /// Every kind, in a fixed order usable for slot indexing.
    pub const ALL: [Self; 12] = [
        Self::Added,
        Self::Deleted,
        Self::Moved,
        Self::Stopped,
        Self::CheckWait,
        Self::Checked,
        Self::StartWait,
        Self::Started,
        Self::SeedWait,
        Self::Seeded,
        Self::Progress,
        Self::Exists,
    ];

    /// Stable slot index of this kind.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A discrete change detected between two consecutive polls, carrying the
/// snapshot it was derived from.
///
/// Transition and addition events carry the post-poll snapshot; `Deleted`
/// carries the last snapshot observed before the torrent vanished.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Torrent appeared since the previous poll.
    Added(TorrentSnapshot),
    /// Torrent vanished since the previous poll.
    Deleted(TorrentSnapshot),
    /// Download directory changed.
    Moved(TorrentSnapshot),
    /// Status became stopped.
    Stopped(TorrentSnapshot),
    /// Status became check-wait.
    CheckWait(TorrentSnapshot),
    /// Status became checking.
    Checked(TorrentSnapshot),
    /// Status became download-wait.
    StartWait(TorrentSnapshot),
    /// Status became downloading.
    Started(TorrentSnapshot),
    /// Status became seed-wait.
    SeedWait(TorrentSnapshot),
    /// Status became seeding.
    Seeded(TorrentSnapshot),
    /// Downloaded byte count changed.
    Progress(TorrentSnapshot),
    /// Torrent was already present on the first completed poll.
    Exists(TorrentSnapshot),
}

impl LifecycleEvent {
    /// Builds the transition event announcing `snapshot`'s current status.
    pub fn transition(snapshot: TorrentSnapshot) -> Self {
        match snapshot.status {
            TorrentStatus::Stopped => Self::Stopped(snapshot),
            TorrentStatus::CheckWait => Self::CheckWait(snapshot),
            TorrentStatus::Checking => Self::Checked(snapshot),
            TorrentStatus::DownloadWait => Self::StartWait(snapshot),
            TorrentStatus::Downloading => Self::Started(snapshot),
            TorrentStatus::SeedWait => Self::SeedWait(snapshot),
            TorrentStatus::Seeding => Self::Seeded(snapshot),
        }
    }

    /// The discriminant used for handler lookup.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Added(_) => EventKind::Added,
            Self::Deleted(_) => EventKind::Deleted,
            Self::Moved(_) => EventKind::Moved,
            Self::Stopped(_) => EventKind::Stopped,
            Self::CheckWait(_) => EventKind::CheckWait,
            Self::Checked(_) => EventKind::Checked,
            Self::StartWait(_) => EventKind::StartWait,
            Self::Started(_) => EventKind::Started,
            Self::SeedWait(_) => EventKind::SeedWait,
            Self::Seeded(_) => EventKind::Seeded,
            Self::Progress(_) => EventKind::Progress,
            Self::Exists(_) => EventKind::Exists,
        }
    }

    /// The snapshot the event was derived from.
    pub const fn snapshot(&self) -> &TorrentSnapshot {
        match self {
            Self::Added(t)
            | Self::Deleted(t)
            | Self::Moved(t)
            | Self::Stopped(t)
            | Self::CheckWait(t)
            | Self::Checked(t)
            | Self::StartWait(t)
            | Self::Started(t)
            | Self::SeedWait(t)
            | Self::Seeded(t)
            | Self::Progress(t)
            | Self::Exists(t) => t,
        }
    }
}
