//! TorrServer adapter
//!
//! TorrServer streams directly, so stream URLs are built at enumeration time
//! and [`DebridProvider::get_download`] is a passthrough.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::catalog;
use super::classify::{self, Payload};
use super::error::{DebridError, Result};
use super::http::{Auth, HttpConfig, RequestBody, RequestClient};
use super::models::TsTorrent;
use super::poller::{CancelSignal, guard};
use super::traits::DebridProvider;
use super::types::{
    CachedFilesPredicate, ConfigField, FieldKind, FileRecord, HelpLink, ProgressSnapshot,
    ProviderConfig, TorrentCandidate, TorrentProgress, fingerprint,
};

pub static DESCRIPTOR: ProviderConfig = ProviderConfig {
    id: "torrserver",
    name: "TorrServer",
    short_name: "TS",
    cache_check_available: false,
    fields: &[
        ConfigField {
            name: "torrserverUrl",
            kind: FieldKind::Text,
            label: "TorrServer URL",
            required: true,
            help: Some(HelpLink {
                url: "https://github.com/YouROK/TorrServer",
                label: "TorrServer GitHub",
            }),
        },
        ConfigField {
            name: "torrserverUsername",
            kind: FieldKind::Text,
            label: "TorrServer Username (optional)",
            required: false,
            help: None,
        },
        ConfigField {
            name: "torrserverPassword",
            kind: FieldKind::Password,
            label: "TorrServer Password (optional)",
            required: false,
            help: None,
        },
    ],
};

const TORRENT_MIME: &str = "application/x-bittorrent";

/// Settings shared by every TorrServer instance
#[derive(Debug, Clone)]
pub struct TorrServerOptions {
    pub http: HttpConfig,
    /// Status reads while waiting for torrent metadata
    pub metadata_attempts: u32,
    pub metadata_interval: Duration,
}

impl Default for TorrServerOptions {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            metadata_attempts: 30,
            metadata_interval: Duration::from_secs(2),
        }
    }
}

/// TorrServer bound to one user's server URL and optional login
pub struct TorrServer {
    client: RequestClient,
    username: String,
    metadata_attempts: u32,
    metadata_interval: Duration,
}

impl TorrServer {
    pub fn new(
        url: &str,
        username: Option<String>,
        password: Option<String>,
        options: &TorrServerOptions,
    ) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(DebridError::Config("TorrServer requires a URL".into()));
        }

        let username = username.unwrap_or_default();
        let password = password.unwrap_or_default();

        // Basic auth only when both halves are present
        let auth = if !username.is_empty() && !password.is_empty() {
            Auth::Basic {
                username: username.clone(),
                password,
            }
        } else {
            Auth::None
        };

        let client = RequestClient::new(url.trim(), auth, &options.http)?;

        Ok(Self {
            client,
            username,
            metadata_attempts: options.metadata_attempts,
            metadata_interval: options.metadata_interval,
        })
    }

    pub fn url(&self) -> &str {
        self.client.base_url()
    }

    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<Payload> {
        let response = self.client.send(method, path, body).await?;
        classify::torrserver(response)
    }

    async fn torrents_action(&self, body: Value) -> Result<Payload> {
        self.request(Method::POST, "/torrents", RequestBody::Json(body))
            .await
    }

    fn added_hash(payload: Payload) -> Result<String> {
        let raw = payload.raw();
        payload
            .into_json()
            .and_then(|value| serde_json::from_value::<TsTorrent>(value).ok())
            .and_then(|torrent| torrent.hash)
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| DebridError::Provider {
                message: "Failed to add torrent to TorrServer".into(),
                raw,
            })
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String> {
        let payload = self
            .torrents_action(json!({
                "action": "add",
                "link": magnet,
                "save_to_db": true,
            }))
            .await?;
        Self::added_hash(payload)
    }

    async fn upload(&self, torrent: Bytes, info_hash: &str) -> Result<String> {
        let part = Part::bytes(torrent.to_vec())
            .file_name("torrent.torrent")
            .mime_str(TORRENT_MIME)?;
        let title = if info_hash.is_empty() {
            "Torrent".to_string()
        } else {
            info_hash.to_string()
        };
        let form = Form::new()
            .part("file", part)
            .text("title", title)
            .text("save", "true");

        let payload = self
            .request(Method::POST, "/torrent/upload", RequestBody::Multipart(form))
            .await?;
        Self::added_hash(payload)
    }

    /// List files once TorrServer has fetched the torrent metadata.
    ///
    /// Each status read and sleep is abandoned when `cancel` fires.
    async fn files_from_torrent(
        &self,
        hash: &str,
        cancel: Option<&CancelSignal>,
    ) -> Result<Vec<FileRecord>> {
        for attempt in 1..=self.metadata_attempts {
            let action = json!({"action": "get", "hash": hash});
            let value = guard(cancel, self.torrents_action(action))
                .await??
                .into_json()
                .filter(|value| !value.is_null())
                .ok_or_else(|| DebridError::Resolution(format!("torrent {} not found", hash)))?;
            let torrent: TsTorrent = serde_json::from_value(value)?;

            if let Some(files) = torrent.file_stats.filter(|files| !files.is_empty()) {
                return Ok(catalog::from_torrserver(self.url(), hash, &files));
            }

            debug!(hash, attempt, "Waiting for torrent metadata");
            guard(cancel, tokio::time::sleep(self.metadata_interval)).await?;
        }

        Err(DebridError::NotReady(format!(
            "no metadata for torrent {} after {} checks",
            hash, self.metadata_attempts
        )))
    }
}

#[async_trait]
impl DebridProvider for TorrServer {
    fn descriptor(&self) -> &'static ProviderConfig {
        &DESCRIPTOR
    }

    async fn get_torrents_cached(
        &self,
        _torrents: &[TorrentCandidate],
        _is_valid_cached_files: &CachedFilesPredicate,
    ) -> Result<Vec<TorrentCandidate>> {
        Ok(Vec::new())
    }

    async fn get_progress_torrents(
        &self,
        _torrents: &[TorrentCandidate],
    ) -> Result<ProgressSnapshot> {
        let torrents = match self.torrents_action(json!({"action": "list"})).await?.into_json() {
            Some(value @ Value::Array(_)) => serde_json::from_value::<Vec<TsTorrent>>(value)?,
            _ => Vec::new(),
        };

        Ok(torrents
            .into_iter()
            .filter_map(|torrent| {
                let percent = torrent.progress_percent();
                let speed = torrent.speed().max(0.0).round() as u64;
                let hash = torrent.hash.filter(|hash| !hash.is_empty())?;
                Some((hash.to_lowercase(), TorrentProgress { percent, speed }))
            })
            .collect())
    }

    async fn get_files_from_magnet(
        &self,
        magnet: &str,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        let hash = self.add_magnet(magnet).await?;
        info!(info_hash, hash, "Magnet added to TorrServer");
        self.files_from_torrent(&hash, None).await
    }

    async fn get_files_from_magnet_cancellable(
        &self,
        magnet: &str,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        let hash = guard(Some(&cancel), self.add_magnet(magnet)).await??;
        info!(info_hash, hash, "Magnet added to TorrServer");
        self.files_from_torrent(&hash, Some(&cancel)).await
    }

    async fn get_files_from_buffer(
        &self,
        torrent: Bytes,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        let hash = self.upload(torrent, info_hash).await?;
        info!(info_hash, hash, "Torrent file uploaded to TorrServer");
        self.files_from_torrent(&hash, None).await
    }

    async fn get_files_from_buffer_cancellable(
        &self,
        torrent: Bytes,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        let hash = guard(Some(&cancel), self.upload(torrent, info_hash)).await??;
        info!(info_hash, hash, "Torrent file uploaded to TorrServer");
        self.files_from_torrent(&hash, Some(&cancel)).await
    }

    async fn get_download(&self, file: &FileRecord) -> Result<String> {
        Ok(file.url.clone())
    }

    async fn get_user_hash(&self) -> Result<String> {
        Ok(fingerprint(&[self.url(), self.username.as_str()]))
    }
}
