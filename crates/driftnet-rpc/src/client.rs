//! Transmission RPC method wrappers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use driftnet_types::{RpcError, TorrentSnapshot};

use crate::transport::{HttpTransport, Transport};

/// Field set requested on every watch poll.
pub const WATCH_FIELDS: [&str; 6] = [
    "id",
    "name",
    "hashString",
    "status",
    "downloadedEver",
    "downloadDir",
];

/// Torrent address: the daemon accepts numeric ids and info hashes
/// interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TorrentId {
    /// Daemon-assigned numeric id.
    Id(i64),
    /// Info hash.
    Hash(String),
}

impl From<i64> for TorrentId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TorrentId {
    fn from(hash: &str) -> Self {
        Self::Hash(hash.to_owned())
    }
}

/// Subset of mutable session settings, one field per `session-set` argument.
///
/// Unset fields are omitted from the request and left untouched on the
/// daemon.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionMutator {
    /// Global alternate speed limit toggle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_speed_enabled: Option<bool>,
    /// Directory completed torrents download into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
    /// Whether the download queue limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_queue_enabled: Option<bool>,
    /// Maximum number of torrents downloading at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_queue_size: Option<i32>,
    /// Directory incomplete torrents download into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete_dir: Option<String>,
    /// Whether the incomplete directory is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete_dir_enabled: Option<bool>,
    /// Global connected-peer limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_limit_global: Option<i32>,
    /// Whether the seed queue limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_queue_enabled: Option<bool>,
    /// Maximum number of torrents seeding at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_queue_size: Option<i32>,
    /// Download speed limit in KB/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_down: Option<i32>,
    /// Whether the download speed limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_down_enabled: Option<bool>,
    /// Upload speed limit in KB/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_up: Option<i32>,
    /// Whether the upload speed limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_up_enabled: Option<bool>,
}

/// Session statistics as returned by `session-stats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)] // rationale: these are the same fields as in Transmission RPC
pub struct SessionStats {
    pub active_torrent_count: i64,

    #[serde(rename = "cumulative-stats")]
    pub cumulative_stats: StatsDetails,

    #[serde(rename = "current-stats")]
    pub current_stats: StatsDetails,

    pub download_speed: i64,

    pub paused_torrent_count: i64,

    pub torrent_count: i64,

    pub upload_speed: i64,
}

/// Detailed statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StatsDetails {
    pub downloaded_bytes: i64,

    pub files_added: i64,

    pub seconds_active: i64,

    pub session_count: i64,

    pub uploaded_bytes: i64,
}

/// The torrent record `torrent-add` hands back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedTorrent {
    /// Daemon-assigned numeric id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Info hash.
    pub hash_string: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "torrent-added")]
    added: Option<AddedTorrent>,
    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<AddedTorrent>,
}

#[derive(Debug, Deserialize)]
struct TorrentList {
    torrents: Vec<TorrentSnapshot>,
}

#[derive(Debug, Deserialize)]
struct BlocklistSize {
    #[serde(rename = "blocklist-size")]
    blocklist_size: i64,
}

#[derive(Debug, Deserialize)]
struct PortIsOpen {
    #[serde(rename = "port-is-open")]
    port_is_open: bool,
}

/// Client for the Transmission RPC protocol.
///
/// One thin wrapper per remote method; each shapes the arguments object and
/// hands the envelope to the [`Transport`].
#[derive(Debug)]
pub struct RpcClient<T: Transport = HttpTransport> {
    transport: T,
}

impl RpcClient {
    /// Creates a client for an unauthenticated daemon at `url`.
    pub fn new(url: Url) -> Self {
        Self {
            transport: HttpTransport::new(url),
        }
    }

    /// Creates a client sending HTTP basic auth with every request.
    pub fn with_auth(
        url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport: HttpTransport::with_basic_auth(url, username, password),
        }
    }
}

impl<T: Transport> RpcClient<T> {
    /// Creates a client on top of a custom transport implementation.
    /// This is primarily useful for testing with mocks.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Fetches the watched field set for every torrent the daemon knows.
    pub async fn torrent_snapshots(&self) -> Result<Vec<TorrentSnapshot>, RpcError> {
        let arguments = self.torrent_get(&WATCH_FIELDS, None).await?;
        let list: TorrentList = serde_json::from_value(arguments)
            .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
        Ok(list.torrents)
    }

    /// Fetches `fields` for the given torrents, or for all torrents when
    /// `ids` is `None`.
    pub async fn torrent_get(
        &self,
        fields: &[&str],
        ids: Option<Vec<TorrentId>>,
    ) -> Result<Value, RpcError> {
        let mut arguments = Map::new();
        arguments.insert("fields".into(), json!(fields));
        if let Some(ids) = ids {
            arguments.insert("ids".into(), json!(ids));
        }
        self.invoke_expecting_arguments("torrent-get", Some(Value::Object(arguments)))
            .await
    }

    /// Starts the given torrents, honoring the queue.
    pub async fn torrent_start(&self, ids: Option<Vec<TorrentId>>) -> Result<(), RpcError> {
        self.torrent_action("torrent-start", ids).await
    }

    /// Starts the given torrents immediately, bypassing the queue.
    pub async fn torrent_start_now(&self, ids: Option<Vec<TorrentId>>) -> Result<(), RpcError> {
        self.torrent_action("torrent-start-now", ids).await
    }

    /// Stops the given torrents.
    pub async fn torrent_stop(&self, ids: Option<Vec<TorrentId>>) -> Result<(), RpcError> {
        self.torrent_action("torrent-stop", ids).await
    }

    /// Queues the given torrents for local data verification.
    pub async fn torrent_verify(&self, ids: Option<Vec<TorrentId>>) -> Result<(), RpcError> {
        self.torrent_action("torrent-verify", ids).await
    }

    /// Asks the trackers for more peers for the given torrents.
    pub async fn torrent_reannounce(&self, ids: Option<Vec<TorrentId>>) -> Result<(), RpcError> {
        self.torrent_action("torrent-reannounce", ids).await
    }

    /// Sets one mutable property on the given torrents.
    pub async fn torrent_set(
        &self,
        ids: Option<Vec<TorrentId>>,
        property: &str,
        value: Value,
    ) -> Result<(), RpcError> {
        let mut arguments = Map::new();
        arguments.insert(property.to_owned(), value);
        if let Some(ids) = ids {
            arguments.insert("ids".into(), json!(ids));
        }
        self.invoke("torrent-set", Some(Value::Object(arguments)))
            .await
            .map(drop)
    }

    /// Adds a torrent from a file path or magnet link, with optional extra
    /// `torrent-add` arguments such as `download-dir`.
    ///
    /// Returns `None` if the daemon reported neither a new nor a duplicate
    /// torrent.
    pub async fn torrent_add_filename(
        &self,
        filename: &str,
        extra: Option<Value>,
    ) -> Result<Option<AddedTorrent>, RpcError> {
        let mut arguments = Map::new();
        arguments.insert("filename".into(), json!(filename));
        self.torrent_add(arguments, extra).await
    }

    /// Adds a torrent from base64-encoded metainfo, with optional extra
    /// `torrent-add` arguments.
    pub async fn torrent_add_metainfo(
        &self,
        metainfo: &str,
        extra: Option<Value>,
    ) -> Result<Option<AddedTorrent>, RpcError> {
        let mut arguments = Map::new();
        arguments.insert("metainfo".into(), json!(metainfo));
        self.torrent_add(arguments, extra).await
    }

    /// Removes the given torrents, deleting their data when asked to.
    pub async fn torrent_remove(
        &self,
        ids: Option<Vec<TorrentId>>,
        delete_local_data: bool,
    ) -> Result<(), RpcError> {
        let mut arguments = Map::new();
        arguments.insert("delete-local-data".into(), json!(delete_local_data));
        if let Some(ids) = ids {
            arguments.insert("ids".into(), json!(ids));
        }
        self.invoke("torrent-remove", Some(Value::Object(arguments)))
            .await
            .map(drop)
    }

    /// Moves the given torrents to `location`. With `move_data` the daemon
    /// moves existing data there; otherwise it looks for data already in
    /// place.
    pub async fn torrent_set_location(
        &self,
        location: &str,
        ids: Option<Vec<TorrentId>>,
        move_data: bool,
    ) -> Result<(), RpcError> {
        let mut arguments = Map::new();
        arguments.insert("location".into(), json!(location));
        arguments.insert("move".into(), json!(move_data));
        if let Some(ids) = ids {
            arguments.insert("ids".into(), json!(ids));
        }
        self.invoke("torrent-set-location", Some(Value::Object(arguments)))
            .await
            .map(drop)
    }

    /// Fetches the full session settings object.
    pub async fn session_get(&self) -> Result<Value, RpcError> {
        self.invoke_expecting_arguments("session-get", None).await
    }

    /// Applies the set fields of `mutator` to the session.
    pub async fn session_set(&self, mutator: SessionMutator) -> Result<(), RpcError> {
        let arguments = serde_json::to_value(mutator)
            .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
        self.invoke("session-set", Some(arguments)).await.map(drop)
    }

    /// Fetches session statistics.
    pub async fn session_stats(&self) -> Result<SessionStats, RpcError> {
        let arguments = self.invoke_expecting_arguments("session-stats", None).await?;
        serde_json::from_value(arguments).map_err(|e| RpcError::MalformedPayload(e.to_string()))
    }

    /// Triggers a blocklist update and returns the new blocklist size.
    pub async fn blocklist_update(&self) -> Result<i64, RpcError> {
        let arguments = self
            .invoke_expecting_arguments("blocklist-update", None)
            .await?;
        let size: BlocklistSize = serde_json::from_value(arguments)
            .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
        Ok(size.blocklist_size)
    }

    /// Asks the daemon whether its peer port is reachable from outside.
    pub async fn port_test(&self) -> Result<bool, RpcError> {
        let arguments = self.invoke_expecting_arguments("port-test", None).await?;
        let open: PortIsOpen = serde_json::from_value(arguments)
            .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
        Ok(open.port_is_open)
    }

    async fn torrent_add(
        &self,
        mut arguments: Map<String, Value>,
        extra: Option<Value>,
    ) -> Result<Option<AddedTorrent>, RpcError> {
        // Extra arguments land in the same arguments object as the torrent
        // source, later keys winning.
        if let Some(Value::Object(extra)) = extra {
            arguments.extend(extra);
        }
        let arguments = self
            .invoke_expecting_arguments("torrent-add", Some(Value::Object(arguments)))
            .await?;
        let response: AddResponse = serde_json::from_value(arguments)
            .map_err(|e| RpcError::MalformedPayload(e.to_string()))?;
        Ok(response.added.or(response.duplicate))
    }

    async fn torrent_action(
        &self,
        method: &str,
        ids: Option<Vec<TorrentId>>,
    ) -> Result<(), RpcError> {
        let arguments = ids.map(|ids| json!({ "ids": ids }));
        self.invoke(method, arguments).await.map(drop)
    }

    async fn invoke(
        &self,
        method: &str,
        arguments: Option<Value>,
    ) -> Result<Option<Value>, RpcError> {
        debug!(method, "rpc call");
        self.transport.call(method, arguments).await
    }

    async fn invoke_expecting_arguments(
        &self,
        method: &str,
        arguments: Option<Value>,
    ) -> Result<Value, RpcError> {
        self.invoke(method, arguments).await?.ok_or_else(|| {
            RpcError::MalformedPayload(format!("{method} response carried no arguments"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::torrent_record;
    use crate::transport::MockTransport;

    use driftnet_types::TorrentStatus;

    #[tokio::test]
    async fn torrent_snapshots_requests_the_watch_fields() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                let fields = arguments
                    .as_ref()
                    .and_then(|a| a.get("fields"))
                    .and_then(Value::as_array)
                    .expect("fields array");
                method == "torrent-get" && fields.iter().any(|f| f == "downloadDir")
            })
            .returning(|_, _| {
                Ok(Some(json!({
                    "torrents": [
                        torrent_record(1, "first", "aaa", 4, 100, "/downloads"),
                        torrent_record(2, "second", "bbb", 0, 0, "/downloads"),
                    ]
                })))
            });

        let client = RpcClient::with_transport(transport);
        let snapshots = client.torrent_snapshots().await.unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].hash_string, "aaa");
        assert_eq!(snapshots[0].status, TorrentStatus::Downloading);
        assert_eq!(snapshots[1].status, TorrentStatus::Stopped);
    }

    #[tokio::test]
    async fn torrent_snapshots_flags_missing_arguments() {
        let mut transport = MockTransport::new();
        transport.expect_call().returning(|_, _| Ok(None));

        let client = RpcClient::with_transport(transport);
        let result = client.torrent_snapshots().await;

        assert!(matches!(result, Err(RpcError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn torrent_start_wraps_ids() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                method == "torrent-start"
                    && arguments.as_ref().and_then(|a| a.get("ids"))
                        == Some(&json!([3, "deadbeef"]))
            })
            .returning(|_, _| Ok(None));

        let client = RpcClient::with_transport(transport);
        client
            .torrent_start(Some(vec![3.into(), "deadbeef".into()]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn torrent_add_merges_extra_arguments() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                let arguments = arguments.as_ref().expect("arguments object");
                method == "torrent-add"
                    && arguments.get("filename") == Some(&json!("/srv/sample.torrent"))
                    && arguments.get("download-dir") == Some(&json!("/library"))
                    && arguments.get("paused") == Some(&json!(true))
            })
            .returning(|_, _| {
                Ok(Some(json!({
                    "torrent-added": {"id": 7, "name": "sample", "hashString": "ccc"}
                })))
            });

        let client = RpcClient::with_transport(transport);
        let added = client
            .torrent_add_filename(
                "/srv/sample.torrent",
                Some(json!({"download-dir": "/library", "paused": true})),
            )
            .await
            .unwrap()
            .expect("torrent record");

        assert_eq!(added.id, 7);
        assert_eq!(added.hash_string, "ccc");
    }

    #[tokio::test]
    async fn torrent_add_reports_duplicates() {
        let mut transport = MockTransport::new();
        transport.expect_call().returning(|_, _| {
            Ok(Some(json!({
                "torrent-duplicate": {"id": 7, "name": "sample", "hashString": "ccc"}
            })))
        });

        let client = RpcClient::with_transport(transport);
        let added = client
            .torrent_add_filename("/srv/sample.torrent", None)
            .await
            .unwrap();

        assert_eq!(added.map(|t| t.hash_string), Some("ccc".to_owned()));
    }

    #[tokio::test]
    async fn torrent_remove_sends_delete_flag() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                let arguments = arguments.as_ref().expect("arguments object");
                method == "torrent-remove"
                    && arguments.get("delete-local-data") == Some(&json!(true))
                    && arguments.get("ids") == Some(&json!(["aaa"]))
            })
            .returning(|_, _| Ok(None));

        let client = RpcClient::with_transport(transport);
        client
            .torrent_remove(Some(vec!["aaa".into()]), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn torrent_set_location_shapes_arguments() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                let arguments = arguments.as_ref().expect("arguments object");
                method == "torrent-set-location"
                    && arguments.get("location") == Some(&json!("/new/home"))
                    && arguments.get("move") == Some(&json!(true))
            })
            .returning(|_, _| Ok(None));

        let client = RpcClient::with_transport(transport);
        client
            .torrent_set_location("/new/home", Some(vec![1.into()]), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn session_set_omits_unset_fields() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|method, arguments| {
                let arguments = arguments.as_ref().expect("arguments object");
                method == "session-set"
                    && arguments.get("download-queue-size") == Some(&json!(2))
                    && arguments.get("download-queue-enabled") == Some(&json!(true))
                    && arguments.get("speed-limit-down").is_none()
            })
            .returning(|_, _| Ok(None));

        let client = RpcClient::with_transport(transport);
        client
            .session_set(SessionMutator {
                download_queue_enabled: Some(true),
                download_queue_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn session_stats_parses_nested_details() {
        let mut transport = MockTransport::new();
        transport.expect_call().returning(|_, _| {
            Ok(Some(json!({
                "activeTorrentCount": 1,
                "downloadSpeed": 1000,
                "uploadSpeed": 500,
                "pausedTorrentCount": 0,
                "torrentCount": 1,
                "cumulative-stats": {
                    "downloadedBytes": 1000,
                    "filesAdded": 5,
                    "secondsActive": 3600,
                    "sessionCount": 10,
                    "uploadedBytes": 500
                },
                "current-stats": {
                    "downloadedBytes": 100,
                    "filesAdded": 1,
                    "secondsActive": 600,
                    "sessionCount": 1,
                    "uploadedBytes": 50
                }
            })))
        });

        let client = RpcClient::with_transport(transport);
        let stats = client.session_stats().await.unwrap();

        assert_eq!(stats.active_torrent_count, 1);
        assert_eq!(stats.download_speed, 1000);
        assert_eq!(stats.cumulative_stats.downloaded_bytes, 1000);
        assert_eq!(stats.current_stats.session_count, 1);
    }

    #[tokio::test]
    async fn port_test_unwraps_flag() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .returning(|_, _| Ok(Some(json!({"port-is-open": true}))));

        let client = RpcClient::with_transport(transport);
        assert!(client.port_test().await.unwrap());
    }

    #[tokio::test]
    async fn blocklist_update_unwraps_size() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .returning(|_, _| Ok(Some(json!({"blocklist-size": 393003}))));

        let client = RpcClient::with_transport(transport);
        assert_eq!(client.blocklist_update().await.unwrap(), 393003);
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .returning(|_, _| Err(RpcError::Unauthorized));

        let client = RpcClient::with_transport(transport);
        let result = client.session_get().await;

        assert!(matches!(result, Err(RpcError::Unauthorized)));
    }
}
