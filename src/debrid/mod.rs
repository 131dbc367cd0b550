//! Debrid provider adapters
//!
//! Resolves a torrent (info-hash, magnet link or `.torrent` bytes) into a direct
//! download URL through a third-party debrid service, behind one contract.
//!
//! ## Key Components
//!
//! - [`DebridProvider`] - Operations every provider implements
//! - [`DebridClient`] - Enum dispatch over the configured provider
//! - [`ReadinessPoller`] - Bounded wait for a torrent to become downloadable
//! - [`DebridError`] - Failures, mapped onto a shared [`ErrorKind`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use debridge::debrid::{DebridClient, DebridProvider, ProviderKind, ProviderOptions};
//!
//! let client = DebridClient::from_credentials(ProviderKind::RealDebrid, &creds, &options)?;
//! let files = client.get_files_from_hash("abc123").await?;
//! let url = client.get_download(&files[0]).await?;
//! ```

pub mod catalog;
pub mod classify;
mod client;
mod error;
pub mod http;
pub mod models;
mod poller;
pub mod realdebrid;
pub mod torrserver;
mod traits;
mod types;

pub use client::{DebridClient, ProviderKind, ProviderOptions};
pub use error::{DebridError, ErrorKind, Result};
pub use http::HttpConfig;
pub use poller::{
    CancelHandle, CancelSignal, Phase, PollConfig, PollSnapshot, ReadinessPoller, StatusSource,
    cancel_pair,
};
pub use realdebrid::{RealDebrid, RealDebridOptions};
pub use torrserver::{TorrServer, TorrServerOptions};
pub use traits::DebridProvider;
pub use types::{
    CachedFilesPredicate, ConfigField, FieldKind, FileId, FileRecord, HelpLink,
    ProgressSnapshot, ProviderConfig, TorrentCandidate, TorrentProgress, UserCredentials,
    fingerprint, magnet_from_hash,
};
