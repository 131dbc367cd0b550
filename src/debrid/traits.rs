use async_trait::async_trait;
use bytes::Bytes;

use super::error::Result;
use super::poller::{CancelSignal, guard};
use super::types::{
    CachedFilesPredicate, FileRecord, ProgressSnapshot, ProviderConfig, TorrentCandidate,
    magnet_from_hash,
};

/// Uniform contract every debrid provider implements.
///
/// Each implementation owns its credentials and request signing; nothing is
/// shared between instances.
#[async_trait]
pub trait DebridProvider: Send + Sync {
    /// Static descriptor of this provider
    fn descriptor(&self) -> &'static ProviderConfig;

    /// Whether [`DebridProvider::get_torrents_cached`] can give a real answer
    fn cache_check_available(&self) -> bool {
        self.descriptor().cache_check_available
    }

    /// Filter `torrents` down to those already cached provider-side.
    ///
    /// An empty result means "treat none as pre-cached", not "none are cached".
    async fn get_torrents_cached(
        &self,
        torrents: &[TorrentCandidate],
        is_valid_cached_files: &CachedFilesPredicate,
    ) -> Result<Vec<TorrentCandidate>>;

    /// Progress of every torrent on the account, keyed by lower-cased hash
    async fn get_progress_torrents(&self, torrents: &[TorrentCandidate])
    -> Result<ProgressSnapshot>;

    /// Enumerate files from a bare info-hash
    async fn get_files_from_hash(&self, info_hash: &str) -> Result<Vec<FileRecord>> {
        self.get_files_from_magnet(&magnet_from_hash(info_hash), info_hash)
            .await
    }

    /// Enumerate files from a magnet link, reusing an existing torrent when possible
    async fn get_files_from_magnet(&self, magnet: &str, info_hash: &str)
    -> Result<Vec<FileRecord>>;

    /// Enumerate files from raw `.torrent` bytes
    async fn get_files_from_buffer(&self, torrent: Bytes, info_hash: &str)
    -> Result<Vec<FileRecord>>;

    /// [`DebridProvider::get_files_from_magnet`], abandoned when `cancel` fires
    async fn get_files_from_magnet_cancellable(
        &self,
        magnet: &str,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        guard(Some(&cancel), self.get_files_from_magnet(magnet, info_hash)).await?
    }

    /// [`DebridProvider::get_files_from_buffer`], abandoned when `cancel` fires
    async fn get_files_from_buffer_cancellable(
        &self,
        torrent: Bytes,
        info_hash: &str,
        cancel: CancelSignal,
    ) -> Result<Vec<FileRecord>> {
        guard(Some(&cancel), self.get_files_from_buffer(torrent, info_hash)).await?
    }

    /// Resolve an enumerated file into a direct download URL
    async fn get_download(&self, file: &FileRecord) -> Result<String>;

    /// [`DebridProvider::get_download`], abandoned when `cancel` fires.
    ///
    /// The in-flight request is dropped on cancellation.
    async fn get_download_cancellable(
        &self,
        file: &FileRecord,
        cancel: CancelSignal,
    ) -> Result<String> {
        guard(Some(&cancel), self.get_download(file)).await?
    }

    /// Stable fingerprint of the identifying credentials
    async fn get_user_hash(&self) -> Result<String>;
}
