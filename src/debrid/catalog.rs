//! Normalisation of provider file listings into [`FileRecord`]s

use std::path::Path;

use super::error::{DebridError, Result};
use super::models::{RdFile, RdTorrentInfo, TsFileStat};
use super::types::{FileId, FileRecord};

const VIDEO_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "avi", "divx", "flv", "m2ts", "m4v", "mk3d", "mkv", "mov", "mp4", "mpeg",
    "mpg", "mts", "ogv", "ts", "vob", "webm", "wmv",
];

/// Extension-based check for playable video files
pub fn is_video(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Ids of the files to select on a torrent awaiting selection
pub fn video_file_ids(files: &[RdFile]) -> Vec<u64> {
    files
        .iter()
        .filter(|file| is_video(&file.path))
        .map(|file| file.id)
        .collect()
}

/// Real-Debrid listing; urls are resolved later.
pub fn from_real_debrid(torrent: &RdTorrentInfo) -> Vec<FileRecord> {
    torrent
        .files
        .iter()
        .map(|file| FileRecord {
            name: file
                .path
                .rsplit('/')
                .next()
                .unwrap_or(file.path.as_str())
                .to_string(),
            size: file.bytes,
            id: FileId::new(&torrent.id, file.id).to_string(),
            url: String::new(),
            ready: None,
        })
        .collect()
}

/// Link of `file_id` among the selected files.
///
/// Providers return links for selected files only, aligned with selection
/// order, so the position is taken within the selected subset.
pub fn selected_link<'a>(torrent: &'a RdTorrentInfo, file_id: u64) -> Result<&'a str> {
    let position = torrent
        .files
        .iter()
        .filter(|file| file.selected)
        .position(|file| file.id == file_id)
        .ok_or_else(|| {
            DebridError::Resolution(format!(
                "file {} is not selected in torrent {}",
                file_id, torrent.id
            ))
        })?;

    torrent
        .links
        .get(position)
        .map(String::as_str)
        .filter(|link| !link.is_empty())
        .ok_or_else(|| {
            DebridError::Resolution(format!(
                "no link at index {} for torrent {} ({} links)",
                position,
                torrent.id,
                torrent.links.len()
            ))
        })
}

/// TorrServer listing with stream urls ready to play. Empty files are dropped.
pub fn from_torrserver(base_url: &str, hash: &str, files: &[TsFileStat]) -> Vec<FileRecord> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let stream_name = file.path.as_deref().unwrap_or("file.mp4");
            FileRecord {
                name: file
                    .path
                    .clone()
                    .unwrap_or_else(|| format!("File {}", index)),
                size: file.length,
                id: FileId::new(hash, index).to_string(),
                url: format!(
                    "{}/stream/{}?link={}&index={}&play",
                    base_url,
                    urlencoding::encode(stream_name),
                    hash,
                    file.id
                ),
                ready: Some(true),
            }
        })
        .filter(|file| file.size > 0)
        .collect()
}
