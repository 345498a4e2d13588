//! Source collaborators: asset libraries, remote fetching, scratch storage.
//!
//! The pipeline treats platform asset libraries and network transport as
//! capabilities behind async traits. Each call resolves exactly once with
//! exactly one of a success value or an error; implementations are free to
//! bridge whatever callback machinery they need behind the returned future.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{ConvertError, Result};

/// Declared kind of an incoming asset. Dispatch happens on this, not on the
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredKind {
    Image,
    Video,
    Other(String),
}

/// Where an asset's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// An opaque handle resolved through the configured [`AssetLibrary`].
    Library { id: String },
    /// A remote URL fetched through the configured [`UrlFetcher`].
    Url(String),
    /// A local file handed over by another app or picker.
    File(PathBuf),
}

/// Opaque reference to one unit of media from some source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: DeclaredKind,
    pub location: AssetLocation,
}

impl AssetRef {
    pub fn new(kind: DeclaredKind, location: AssetLocation) -> Self {
        Self { kind, location }
    }

    pub fn image(location: AssetLocation) -> Self {
        Self::new(DeclaredKind::Image, location)
    }

    pub fn video(location: AssetLocation) -> Self {
        Self::new(DeclaredKind::Video, location)
    }
}

/// Raw image payload from a collaborator.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    /// Content-type or extension hint as declared by the source; the sniffer
    /// decides whether to trust it.
    pub type_hint: Option<String>,
}

/// Playable video payload from a collaborator.
#[derive(Debug, Clone)]
pub struct VideoPayload {
    /// Local file the library materialized for us.
    pub local_path: PathBuf,
    /// Originating URL, when the library knows one.
    pub source_url: Option<String>,
}

/// A platform asset library: given an opaque handle, asynchronously yields
/// raw bytes or a playable file.
#[async_trait]
pub trait AssetLibrary: Send + Sync {
    /// Fetch raw encoded bytes and a content-type hint for an image asset.
    async fn fetch_image_bytes(&self, id: &str) -> Result<ImagePayload>;

    /// Fetch a playable local file and the originating URL for a video asset.
    async fn fetch_video(&self, id: &str) -> Result<VideoPayload>;
}

/// Network transport capability: given a URL, yields bytes.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Fetch the bytes at `url`, preferring previously-fetched data over the
    /// network when available.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed fetcher with an in-memory response cache.
///
/// Repeated fetches of the same URL return the cached body without touching
/// the network.
pub struct CachedHttpFetcher {
    client: reqwest::Client,
    responses: DashMap<String, Bytes>,
}

impl CachedHttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            responses: DashMap::new(),
        }
    }
}

impl Default for CachedHttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for CachedHttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        if let Some(hit) = self.responses.get(url) {
            return Ok(hit.value().clone());
        }

        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ConvertError::source(e.to_string()))?
            .error_for_status()
            .map_err(|e| ConvertError::source(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ConvertError::source(e.to_string()))?;

        self.responses.insert(url.to_string(), bytes.clone());
        Ok(bytes)
    }
}

/// Collision-free scratch file name: unix timestamp, random uuid, original
/// extension.
pub(crate) fn scratch_file_name(extension: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}_{}.{}", stamp, Uuid::new_v4(), extension)
}

/// Copy a file into scratch storage under a collision-free name.
pub fn copy_to_local_storage(source: &Path, scratch_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(scratch_dir)?;
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let dest = scratch_dir.join(scratch_file_name(extension));
    std::fs::copy(source, &dest)?;
    Ok(dest)
}

/// Write a buffer into scratch storage under a collision-free name.
pub fn write_to_local_storage(
    bytes: &[u8],
    extension: &str,
    scratch_dir: &Path,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(scratch_dir)?;
    let dest = scratch_dir.join(scratch_file_name(extension));
    std::fs::write(&dest, bytes)?;
    Ok(dest)
}

/// Remove scratch files older than `max_age`, returning how many were
/// deleted.
///
/// Nothing sweeps automatically: conversions deliberately leave their
/// scratch files alone so handed-off selections stay valid. Callers decide
/// the cadence.
pub fn sweep_scratch(scratch_dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut removed = 0;
    if !scratch_dir.exists() {
        return Ok(0);
    }
    for entry in std::fs::read_dir(scratch_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .map(|age| age >= max_age)
            .unwrap_or(false);
        if expired && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}
