use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;

use super::error::{DebridError, Result};

/// Input widget kind for a credential field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
}

/// Link shown next to a credential field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HelpLink {
    pub url: &'static str,
    pub label: &'static str,
}

/// User-supplied credential field declared by a provider
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfigField {
    /// Key in [`UserCredentials`] (serde name)
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<HelpLink>,
}

/// Immutable per-provider descriptor
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProviderConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    /// Whether the provider can be asked for cache status before submission
    pub cache_check_available: bool,
    pub fields: &'static [ConfigField],
}

/// Credentials of one user, keyed by the field names providers declare.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    pub debrid_api_key: Option<String>,
    pub torrserver_url: Option<String>,
    pub torrserver_username: Option<String>,
    pub torrserver_password: Option<String>,
    /// Client IP forwarded on torrent submission
    pub ip: Option<String>,
}

/// Torrent considered for pre-download cache filtering
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TorrentCandidate {
    pub info_hash: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Predicate over the cached file listing of a candidate
pub type CachedFilesPredicate = dyn Fn(&[FileRecord]) -> bool + Send + Sync;

/// Provider-independent file entry returned by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    /// Opaque `<torrent>:<file>` key, see [`FileId`]
    pub id: String,
    /// Empty until resolved, for providers that resolve lazily
    pub url: String,
    pub ready: Option<bool>,
}

/// Download progress of one torrent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TorrentProgress {
    /// 0 to 100
    pub percent: f64,
    /// Bytes per second
    pub speed: u64,
}

/// Progress keyed by lower-cased info-hash
pub type ProgressSnapshot = HashMap<String, TorrentProgress>;

/// Two-part key identifying a file inside a provider-side torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileId {
    pub torrent: String,
    pub file: String,
}

impl FileId {
    pub fn new(torrent: impl Into<String>, file: impl fmt::Display) -> Self {
        Self {
            torrent: torrent.into(),
            file: file.to_string(),
        }
    }

    /// Split `<torrent>:<file>`, rejecting empty parts and extra separators.
    pub fn parse(raw: &str) -> Result<Self> {
        let (torrent, file) = raw
            .split_once(':')
            .ok_or_else(|| DebridError::InvalidFileId(raw.to_string()))?;

        if torrent.is_empty() || file.is_empty() || file.contains(':') {
            return Err(DebridError::InvalidFileId(raw.to_string()));
        }

        Ok(Self {
            torrent: torrent.to_string(),
            file: file.to_string(),
        })
    }

    /// File part as a numeric index
    pub fn file_index(&self) -> Result<u64> {
        self.file
            .parse()
            .map_err(|_| DebridError::InvalidFileId(self.to_string()))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.torrent, self.file)
    }
}

/// Bare magnet URI for an info-hash
pub fn magnet_from_hash(info_hash: &str) -> String {
    format!("magnet:?xt=urn:btih:{}", info_hash)
}

/// Hex SHA-1 over identifying credential parts.
///
/// Parts are NUL-separated so `("ab", "c")` and `("a", "bc")` differ.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_round_trip() {
        let id = FileId::new("ABCDEF", 3);
        assert_eq!(id.to_string(), "ABCDEF:3");

        let parsed = FileId::parse("ABCDEF:3").unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.file_index().unwrap(), 3);
    }

    #[test]
    fn test_file_id_rejects_malformed() {
        for raw in ["", "abc", ":1", "abc:", "a:b:c"] {
            assert!(
                matches!(FileId::parse(raw), Err(DebridError::InvalidFileId(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_index_must_be_numeric() {
        let id = FileId::parse("abc:first").unwrap();
        assert!(matches!(id.file_index(), Err(DebridError::InvalidFileId(_))));
    }

    #[test]
    fn test_credentials_use_field_names() {
        let json = r#"{"debridApiKey": "key", "ip": "1.2.3.4"}"#;
        let creds: UserCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.debrid_api_key.as_deref(), Some("key"));
        assert_eq!(creds.ip.as_deref(), Some("1.2.3.4"));
        assert!(creds.torrserver_url.is_none());
    }

    #[test]
    fn test_file_record_serializes_unknown_ready_as_null() {
        let record = FileRecord {
            name: "movie.mkv".into(),
            size: 524_288_000,
            id: "T1:1".into(),
            url: String::new(),
            ready: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["ready"].is_null());
        assert_eq!(value["size"], 524_288_000u64);
    }

    #[test]
    fn test_fingerprint_is_stable_and_separated() {
        let a = fingerprint(&["http://ts", "user"]);
        assert_eq!(a, fingerprint(&["http://ts", "user"]));
        assert_eq!(a.len(), 40);
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
        assert_eq!(
            fingerprint(&["abc"]),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_magnet_from_hash() {
        assert_eq!(magnet_from_hash("abc123"), "magnet:?xt=urn:btih:abc123");
    }
}
