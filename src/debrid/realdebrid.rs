//! Real-Debrid adapter
//!
//! Files are enumerated up front but links only exist once the torrent is
//! downloaded provider-side, so [`DebridProvider::get_download`] selects the
//! video files and waits for readiness before unrestricting a link.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use super::catalog;
use super::classify;
use super::error::{DebridError, Result};
use super::http::{Auth, HttpConfig, RequestBody, RequestClient};
use super::models::{
    RdAddedTorrent, RdStatus, RdTorrentInfo, RdTorrentSummary, RdUnrestricted,
};
use super::poller::{
    CancelSignal, Phase, PollConfig, PollSnapshot, ReadinessPoller, StatusSource, guard,
};
use super::traits::DebridProvider;
use super::types::{
    CachedFilesPredicate, ConfigField, FieldKind, FileId, FileRecord, HelpLink, ProgressSnapshot,
    ProviderConfig, TorrentCandidate, TorrentProgress, fingerprint,
};

pub const DEFAULT_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";

pub static DESCRIPTOR: ProviderConfig = ProviderConfig {
    id: "realdebrid",
    name: "Real-Debrid",
    short_name: "RD",
    cache_check_available: true,
    fields: &[ConfigField {
        name: "debridApiKey",
        kind: FieldKind::Text,
        label: "Real-Debrid API Key",
        required: true,
        help: Some(HelpLink {
            url: "https://real-debrid.com/apitoken",
            label: "Get API Key Here",
        }),
    }],
};

/// Settings shared by every Real-Debrid instance
#[derive(Debug, Clone)]
pub struct RealDebridOptions {
    pub base_url: String,
    pub http: HttpConfig,
    pub poll: PollConfig,
    pub enable_cache_check: bool,
}

impl Default for RealDebridOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpConfig::default(),
            poll: PollConfig::default(),
            enable_cache_check: false,
        }
    }
}

impl PollSnapshot for RdTorrentInfo {
    fn phase(&self) -> Phase {
        match self.status {
            RdStatus::Downloaded => Phase::Ready,
            RdStatus::Error | RdStatus::Virus | RdStatus::Dead => Phase::Failed,
            RdStatus::MagnetConversion => Phase::Converting,
            _ => Phase::Pending,
        }
    }

    fn status(&self) -> &str {
        self.status.as_str()
    }
}

/// Real-Debrid bound to one user's API key
pub struct RealDebrid {
    client: RequestClient,
    api_key: String,
    ip: Option<String>,
    poll: PollConfig,
    cache_check: bool,
}

impl RealDebrid {
    pub fn new(
        api_key: impl Into<String>,
        ip: Option<String>,
        options: &RealDebridOptions,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DebridError::Config("Real-Debrid requires an API key".into()));
        }

        let client = RequestClient::new(
            &options.base_url,
            Auth::Bearer(api_key.clone()),
            &options.http,
        )?;

        Ok(Self {
            client,
            api_key,
            ip: ip.filter(|ip| !ip.is_empty()),
            poll: options.poll.clone(),
            cache_check: options.enable_cache_check,
        })
    }

    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<Value> {
        let response = self.client.send(method, path, body).await?;
        classify::real_debrid(response)
    }

    /// Form body, with the client IP appended when configured
    fn form(&self, mut fields: Vec<(String, String)>) -> RequestBody {
        if let Some(ip) = &self.ip {
            fields.push(("ip".to_string(), ip.clone()));
        }
        RequestBody::Form(fields)
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<RdTorrentInfo> {
        let value = self
            .request(Method::GET, &format!("/torrents/info/{}", torrent_id), RequestBody::Empty)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Torrents on the account; an absent list is empty
    async fn list_torrents(&self) -> Result<Vec<RdTorrentSummary>> {
        match self
            .request(Method::GET, "/torrents", RequestBody::Empty)
            .await?
        {
            value @ Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn find_active_torrent(&self, info_hash: &str) -> Result<Option<String>> {
        let torrents = self.list_torrents().await?;
        Ok(torrents
            .into_iter()
            .find(|t| t.hash.eq_ignore_ascii_case(info_hash) && t.status.is_active())
            .map(|t| t.id))
    }

    async fn files_from_torrent(&self, torrent_id: &str) -> Result<Vec<FileRecord>> {
        let torrent = self.torrent_info(torrent_id).await?;
        Ok(catalog::from_real_debrid(&torrent))
    }

    fn added_id(value: Value) -> Result<String> {
        let raw = value.to_string();
        let added: RdAddedTorrent = serde_json::from_value(value)?;
        added
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DebridError::Provider {
                message: "Real-Debrid returned no torrent id".into(),
                raw,
            })
    }

    async fn select_video_files(&self, torrent: &RdTorrentInfo) -> Result<()> {
        let ids = catalog::video_file_ids(&torrent.files);
        debug!(torrent_id = %torrent.id, selected = ids.len(), "Selecting video files");

        let files = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let body = self.form(vec![("files".to_string(), files)]);

        self.request(
            Method::POST,
            &format!("/torrents/selectFiles/{}", torrent.id),
            body,
        )
        .await?;
        Ok(())
    }

    async fn unrestrict(&self, link: &str) -> Result<String> {
        let body = self.form(vec![("link".to_string(), link.to_string())]);
        let value = self.request(Method::POST, "/unrestrict/link", body).await?;
        let unrestricted: RdUnrestricted = serde_json::from_value(value)?;

        unrestricted
            .download
            .filter(|url| !url.is_empty())
            .ok_or_else(|| DebridError::Resolution(format!("no download url for {}", link)))
    }

    async fn resolve_download(
        &self,
        file: &FileRecord,
        cancel: Option<CancelSignal>,
    ) -> Result<String> {
        let id = FileId::parse(&file.id)?;
        let file_index = id.file_index()?;
        let torrent_id = id.torrent.as_str();

        let mut torrent = self.torrent_info(torrent_id).await?;

        if torrent.status == RdStatus::WaitingFilesSelection {
            self.select_video_files(&torrent).await?;
            torrent = self.torrent_info(torrent_id).await?;
        }

        let mut poller = ReadinessPoller::new(self.poll.clone());
        if let Some(signal) = cancel {
            poller = poller.with_cancel(signal);
        }
        let torrent = poller.wait_until_ready(self, torrent_id, torrent).await?;

        let link = catalog::selected_link(&torrent, file_index)?;
        let url = self.unrestrict(link).await?;
        info!(torrent_id, file = %file.name, "Resolved download link");
        Ok(url)
    }
}

#[async_trait]
impl StatusSource for RealDebrid {
    type Snapshot = RdTorrentInfo;

    async fn fetch(&self, torrent_id: &str) -> Result<RdTorrentInfo> {
        self.torrent_info(torrent_id).await
    }
}

#[async_trait]
impl DebridProvider for RealDebrid {
    fn descriptor(&self) -> &'static ProviderConfig {
        &DESCRIPTOR
    }

    fn cache_check_available(&self) -> bool {
        DESCRIPTOR.cache_check_available && self.cache_check
    }

    async fn get_torrents_cached(
        &self,
        _torrents: &[TorrentCandidate],
        _is_valid_cached_files: &CachedFilesPredicate,
    ) -> Result<Vec<TorrentCandidate>> {
        // Instant availability lookups are not offered by the API.
        Ok(Vec::new())
    }

    async fn get_progress_torrents(
        &self,
        _torrents: &[TorrentCandidate],
    ) -> Result<ProgressSnapshot> {
        let torrents = self.list_torrents().await?;
        Ok(torrents
            .into_iter()
            .map(|t| {
                (
                    t.hash.to_lowercase(),
                    TorrentProgress {
                        percent: t.progress,
                        speed: t.speed,
                    },
                )
            })
            .collect())
    }

    async fn get_files_from_magnet(
        &self,
        magnet: &str,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        if let Some(torrent_id) = self.find_active_torrent(info_hash).await? {
            info!(info_hash, torrent_id, "Reusing existing torrent");
            return self.files_from_torrent(&torrent_id).await;
        }

        let body = self.form(vec![("magnet".to_string(), magnet.to_string())]);
        let value = self
            .request(Method::POST, "/torrents/addMagnet", body)
            .await?;
        let torrent_id = Self::added_id(value)?;

        info!(info_hash, torrent_id, "Magnet submitted");
        self.files_from_torrent(&torrent_id).await
    }

    async fn get_files_from_buffer(
        &self,
        torrent: Bytes,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        if let Some(torrent_id) = self.find_active_torrent(info_hash).await? {
            info!(info_hash, torrent_id, "Reusing existing torrent");
            return self.files_from_torrent(&torrent_id).await;
        }

        let value = self
            .request(Method::PUT, "/torrents/addTorrent", RequestBody::Raw(torrent))
            .await?;
        let torrent_id = Self::added_id(value)?;

        info!(info_hash, torrent_id, "Torrent file submitted");
        self.files_from_torrent(&torrent_id).await
    }

    async fn get_download(&self, file: &FileRecord) -> Result<String> {
        self.resolve_download(file, None).await
    }

    async fn get_download_cancellable(
        &self,
        file: &FileRecord,
        cancel: CancelSignal,
    ) -> Result<String> {
        let outer = cancel.clone();
        guard(Some(&outer), self.resolve_download(file, Some(cancel))).await?
    }

    async fn get_user_hash(&self) -> Result<String> {
        Ok(fingerprint(&[self.api_key.as_str()]))
    }
}
