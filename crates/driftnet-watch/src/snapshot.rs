//! Hash-keyed snapshot sets preserving daemon listing order.

use std::collections::HashMap;

use driftnet_types::TorrentSnapshot;

/// All torrents known to the daemon as of one poll, keyed by info hash.
///
/// Iteration follows the order records arrived in, so diff output stays
/// stable with respect to the daemon's listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotSet {
    order: Vec<String>,
    by_hash: HashMap<String, TorrentSnapshot>,
}

impl SnapshotSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `snapshot` under its hash, returning the snapshot it
    /// replaced. A replaced torrent keeps its original position.
    pub fn insert(&mut self, snapshot: TorrentSnapshot) -> Option<TorrentSnapshot> {
        let hash = snapshot.hash_string.clone();
        let replaced = self.by_hash.insert(hash.clone(), snapshot);
        if replaced.is_none() {
            self.order.push(hash);
        }
        replaced
    }

    /// Looks up a torrent by info hash.
    pub fn get(&self, hash: &str) -> Option<&TorrentSnapshot> {
        self.by_hash.get(hash)
    }

    /// Whether a torrent with this hash is present.
    pub fn contains(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Number of torrents in the set.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set holds no torrents.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TorrentSnapshot> {
        self.order.iter().filter_map(|hash| self.by_hash.get(hash))
    }
}

impl FromIterator<TorrentSnapshot> for SnapshotSet {
    fn from_iter<I: IntoIterator<Item = TorrentSnapshot>>(snapshots: I) -> Self {
        let mut set = Self::new();
        for snapshot in snapshots {
            set.insert(snapshot);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::snapshot;

    #[test]
    fn iteration_preserves_insertion_order() {
        let set: SnapshotSet = ["ccc", "aaa", "bbb"]
            .into_iter()
            .enumerate()
            .map(|(id, hash)| snapshot(id as i64, hash))
            .collect();

        let hashes: Vec<&str> = set.iter().map(|t| t.hash_string.as_str()).collect();
        assert_eq!(hashes, ["ccc", "aaa", "bbb"]);
    }

    #[test]
    fn insert_replaces_without_reordering() {
        let mut set: SnapshotSet = [snapshot(1, "aaa"), snapshot(2, "bbb")]
            .into_iter()
            .collect();

        let replaced = set.insert(snapshot(9, "aaa"));
        assert_eq!(replaced.map(|t| t.id), Some(1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("aaa").map(|t| t.id), Some(9));

        let hashes: Vec<&str> = set.iter().map(|t| t.hash_string.as_str()).collect();
        assert_eq!(hashes, ["aaa", "bbb"]);
    }

    #[test]
    fn lookup_by_hash() {
        let set: SnapshotSet = [snapshot(1, "aaa")].into_iter().collect();
        assert!(set.contains("aaa"));
        assert!(!set.contains("zzz"));
        assert!(set.get("zzz").is_none());
    }
}
