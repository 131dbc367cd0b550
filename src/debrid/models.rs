//! Wire models of the provider APIs

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Real-Debrid torrent status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RdStatus {
    MagnetError,
    MagnetConversion,
    WaitingFilesSelection,
    Queued,
    Downloading,
    Downloaded,
    Error,
    Virus,
    Compressing,
    Uploading,
    Dead,
    #[serde(other)]
    Unknown,
}

impl RdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RdStatus::MagnetError => "magnet_error",
            RdStatus::MagnetConversion => "magnet_conversion",
            RdStatus::WaitingFilesSelection => "waiting_files_selection",
            RdStatus::Queued => "queued",
            RdStatus::Downloading => "downloading",
            RdStatus::Downloaded => "downloaded",
            RdStatus::Error => "error",
            RdStatus::Virus => "virus",
            RdStatus::Compressing => "compressing",
            RdStatus::Uploading => "uploading",
            RdStatus::Dead => "dead",
            RdStatus::Unknown => "unknown",
        }
    }

    /// States in which an existing torrent is reused instead of resubmitted
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RdStatus::MagnetConversion
                | RdStatus::WaitingFilesSelection
                | RdStatus::Queued
                | RdStatus::Downloading
                | RdStatus::Downloaded
        )
    }
}

/// Entry of `GET /torrents`
#[derive(Debug, Clone, Deserialize)]
pub struct RdTorrentSummary {
    pub id: String,
    #[serde(default)]
    pub hash: String,
    pub status: RdStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed: u64,
}

/// File inside `GET /torrents/info/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct RdFile {
    pub id: u64,
    pub path: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default, deserialize_with = "flag")]
    pub selected: bool,
}

/// `GET /torrents/info/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct RdTorrentInfo {
    pub id: String,
    #[serde(default)]
    pub hash: String,
    pub status: RdStatus,
    #[serde(default)]
    pub files: Vec<RdFile>,
    /// One link per selected file, in selection order
    #[serde(default)]
    pub links: Vec<String>,
}

/// `POST /torrents/addMagnet`, `PUT /torrents/addTorrent`
#[derive(Debug, Clone, Deserialize)]
pub struct RdAddedTorrent {
    #[serde(default)]
    pub id: Option<String>,
}

/// `POST /unrestrict/link`
#[derive(Debug, Clone, Deserialize)]
pub struct RdUnrestricted {
    #[serde(default)]
    pub download: Option<String>,
}

/// Torrent reported by TorrServer `POST /torrents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TsTorrent {
    #[serde(default)]
    pub hash: Option<String>,
    /// Detailed stats when `stat` is an object; the integer state code is ignored
    #[serde(default, deserialize_with = "stat_detail")]
    pub stat: Option<TsStat>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_speed: f64,
    #[serde(default)]
    pub file_stats: Option<Vec<TsFileStat>>,
}

impl TsTorrent {
    pub fn progress_percent(&self) -> f64 {
        self.stat
            .as_ref()
            .map(|stat| stat.download_progress)
            .unwrap_or_default()
    }

    /// Bytes per second, from the stats object or the top-level field
    pub fn speed(&self) -> f64 {
        self.stat
            .as_ref()
            .map(|stat| stat.download_speed)
            .filter(|speed| *speed > 0.0)
            .unwrap_or(self.download_speed)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TsStat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_progress: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TsFileStat {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub length: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn stat_detail<'de, D>(deserializer: D) -> Result<Option<TsStat>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(Value::is_object)
        .and_then(|value| serde_json::from_value(value).ok()))
}

/// Real-Debrid reports `selected` as 0/1
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rd_torrent_info_parses() {
        let json = r#"{
            "id": "T1",
            "hash": "abc123",
            "status": "waiting_files_selection",
            "files": [
                {"id": 1, "path": "/Movie/movie.mkv", "bytes": 1000, "selected": 1},
                {"id": 2, "path": "/Movie/sample.srt", "bytes": 10, "selected": 0}
            ],
            "links": []
        }"#;
        let info: RdTorrentInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.status, RdStatus::WaitingFilesSelection);
        assert!(info.files[0].selected);
        assert!(!info.files[1].selected);
    }

    #[test]
    fn test_rd_unknown_status() {
        let s: RdStatus = serde_json::from_str(r#""something_new""#).unwrap();
        assert_eq!(s, RdStatus::Unknown);
        assert!(!s.is_active());
    }

    #[test]
    fn test_rd_summary_tolerates_null_progress() {
        let json = r#"{"id":"T1","hash":"ABC","status":"downloading","progress":null}"#;
        let summary: RdTorrentSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.progress, 0.0);
        assert_eq!(summary.speed, 0);
    }

    #[test]
    fn test_ts_torrent_with_integer_stat() {
        let json = r#"{
            "hash": "abc123",
            "stat": 3,
            "stat_string": "Torrent working",
            "download_speed": 1024.0,
            "file_stats": [{"id": 1, "path": "Movie/movie.mkv", "length": 524288000}]
        }"#;
        let torrent: TsTorrent = serde_json::from_str(json).unwrap();
        assert!(torrent.stat.is_none());
        assert_eq!(torrent.progress_percent(), 0.0);
        assert_eq!(torrent.speed(), 1024.0);
        assert_eq!(torrent.file_stats.unwrap()[0].length, 524_288_000);
    }

    #[test]
    fn test_ts_torrent_with_stat_object() {
        let json = r#"{"hash":"abc","stat":{"download_progress":40.5,"download_speed":10.0}}"#;
        let torrent: TsTorrent = serde_json::from_str(json).unwrap();
        assert_eq!(torrent.progress_percent(), 40.5);
        assert_eq!(torrent.speed(), 10.0);
    }

    #[test]
    fn test_ts_torrent_without_stats() {
        let torrent: TsTorrent = serde_json::from_str(r#"{"hash":"abc"}"#).unwrap();
        assert!(torrent.file_stats.is_none());
        assert!(torrent.stat.is_none());
    }
}
