use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{DebridError, Result};
use super::poller::CancelSignal;
use super::realdebrid::{self, RealDebrid, RealDebridOptions};
use super::torrserver::{self, TorrServer, TorrServerOptions};
use super::traits::DebridProvider;
use super::types::{
    CachedFilesPredicate, FileRecord, ProgressSnapshot, ProviderConfig, TorrentCandidate,
    UserCredentials,
};

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    RealDebrid,
    TorrServer,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::RealDebrid, ProviderKind::TorrServer];

    pub fn descriptor(&self) -> &'static ProviderConfig {
        match self {
            ProviderKind::RealDebrid => &realdebrid::DESCRIPTOR,
            ProviderKind::TorrServer => &torrserver::DESCRIPTOR,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.descriptor().id == id)
    }

    /// Descriptors of every provider, in display order
    pub fn descriptors() -> Vec<&'static ProviderConfig> {
        Self::ALL.iter().map(ProviderKind::descriptor).collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().id)
    }
}

impl FromStr for ProviderKind {
    type Err = DebridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s).ok_or_else(|| DebridError::Config(format!("unknown provider '{}'", s)))
    }
}

/// Settings applied to every instance, whichever provider is chosen
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub real_debrid: RealDebridOptions,
    pub torrserver: TorrServerOptions,
}

/// Provider instance bound to one user's credentials (enum dispatch)
pub enum DebridClient {
    RealDebrid(RealDebrid),
    TorrServer(TorrServer),
}

impl DebridClient {
    /// Bind `kind` to `credentials`, failing when a required field is absent.
    pub fn from_credentials(
        kind: ProviderKind,
        credentials: &UserCredentials,
        options: &ProviderOptions,
    ) -> Result<Self> {
        match kind {
            ProviderKind::RealDebrid => {
                let api_key = credentials
                    .debrid_api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| DebridError::Config("Real-Debrid requires debridApiKey".into()))?;

                let client =
                    RealDebrid::new(api_key, credentials.ip.clone(), &options.real_debrid)?;
                Ok(Self::RealDebrid(client))
            }
            ProviderKind::TorrServer => {
                let url = credentials
                    .torrserver_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| DebridError::Config("TorrServer requires torrserverUrl".into()))?;

                let client = TorrServer::new(
                    url,
                    credentials.torrserver_username.clone(),
                    credentials.torrserver_password.clone(),
                    &options.torrserver,
                )?;
                Ok(Self::TorrServer(client))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::RealDebrid(_) => ProviderKind::RealDebrid,
            Self::TorrServer(_) => ProviderKind::TorrServer,
        }
    }

    fn inner(&self) -> &dyn DebridProvider {
        match self {
            Self::RealDebrid(p) => p,
            Self::TorrServer(p) => p,
        }
    }
}

#[async_trait]
impl DebridProvider for DebridClient {
    fn descriptor(&self) -> &'static ProviderConfig {
        self.inner().descriptor()
    }

    fn cache_check_available(&self) -> bool {
        self.inner().cache_check_available()
    }

    async fn get_torrents_cached(
        &self,
        torrents: &[TorrentCandidate],
        is_valid_cached_files: &CachedFilesPredicate,
    ) -> Result<Vec<TorrentCandidate>> {
        self.inner()
            .get_torrents_cached(torrents, is_valid_cached_files)
            .await
    }

    async fn get_progress_torrents(
        &self,
        torrents: &[TorrentCandidate],
    ) -> Result<ProgressSnapshot> {
        self.inner().get_progress_torrents(torrents).await
    }

    async fn get_files_from_hash(&self, info_hash: &str) -> Result<Vec<FileRecord>> {
        self.inner().get_files_from_hash(info_hash).await
    }

    async fn get_files_from_magnet(
        &self,
        magnet: &str,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        self.inner().get_files_from_magnet(magnet, info_hash).await
    }

    async fn get_files_from_buffer(
        &self,
        torrent: Bytes,
        info_hash: &str,
    ) -> Result<Vec<FileRecord>> {
        self.inner().get_files_from_buffer(torrent, info_hash).await
    }

    async fn get_files_from_magnet_cancellable(
        &self,
        magnet: &str,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        self.inner()
            .get_files_from_magnet_cancellable(magnet, info_hash, cancel)
            .await
    }

    async fn get_files_from_buffer_cancellable(
        &self,
        torrent: Bytes,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        self.inner()
            .get_files_from_buffer_cancellable(torrent, info_hash, cancel)
            .await
    }

    async fn get_download(&self, file: &FileRecord) -> Result<String> {
        self.inner().get_download(file).await
    }

    async fn get_download_cancellable(
        &self,
        file: &FileRecord,
        cancel: CancelSignal,
    ) -> Result<String> {
        self.inner().get_download_cancellable(file, cancel).await
    }

    async fn get_user_hash(&self) -> Result<String> {
        self.inner().get_user_hash().await
    }
}
