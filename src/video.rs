//! Remote video loading and cache warming.
//!
//! Remote videos are downloaded through the cached URL fetcher, persisted to
//! scratch storage, probed, and kept as opened handles in the bounded video
//! cache. The prefetcher warms that cache over the exact same path the
//! foreground loader uses.

use std::path::PathBuf;
use std::sync::Arc;

use assetforge_av::{QualityPreset, SourceInfo};
use tracing::{debug, warn};

use crate::cache::VideoCache;
use crate::error::{ConvertError, Result};
use crate::source::{self, UrlFetcher};

/// An opened, locally-materialized video: the probed file a transcode or
/// playback session starts from.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    pub local_path: PathBuf,
    pub info: SourceInfo,
}

impl VideoHandle {
    /// Formatted duration label from the probed metadata.
    pub fn duration_label(&self) -> Option<String> {
        self.info.duration_label()
    }

    /// Natural (pre-rotation) size of the video track.
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.info.video.as_ref().map(|v| (v.width, v.height))
    }
}

/// Append delivery-side quality hints to a video URL.
///
/// Backends that understand them serve a cheaper rendition; backends that
/// don't ignore the parameters. Unparseable URLs are returned untouched.
pub fn optimized_url(url: &str, quality: QualityPreset) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    parsed
        .query_pairs_mut()
        .append_pair("optimize", "1")
        .append_pair("bitrate", &format!("{:.1}", quality.bitrate_bps() as f64 / 1e6))
        .append_pair("quality", &format!("{}p", quality.long_edge()));
    parsed.to_string()
}

/// Loader resolving remote URLs into cached [`VideoHandle`]s.
pub struct VideoUrlLoader {
    fetcher: Arc<dyn UrlFetcher>,
    cache: Arc<VideoCache>,
    scratch_dir: PathBuf,
}

impl VideoUrlLoader {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, cache: Arc<VideoCache>, scratch_dir: PathBuf) -> Self {
        Self {
            fetcher,
            cache,
            scratch_dir,
        }
    }

    /// Load a playable handle for `url`, preferring the cache.
    ///
    /// Cache entries may be evicted between calls; a miss re-resolves over
    /// the network (which itself prefers its response cache).
    pub async fn load(&self, url: &str, quality: QualityPreset) -> Result<Arc<VideoHandle>> {
        if let Some(handle) = self.cache.get(url) {
            debug!(url = %url, "video handle served from cache");
            return Ok(handle);
        }

        let request_url = optimized_url(url, quality);
        let bytes = self.fetcher.fetch(&request_url).await?;

        let scratch_dir = self.scratch_dir.clone();
        let local_path = tokio::task::spawn_blocking(move || {
            source::write_to_local_storage(&bytes, "mp4", &scratch_dir)
        })
        .await
        .map_err(|e| ConvertError::internal(e.to_string()))??;

        let probe_path = local_path.clone();
        let info = tokio::task::spawn_blocking(move || assetforge_av::validate(&probe_path))
            .await
            .map_err(|e| ConvertError::internal(e.to_string()))??;

        let handle = Arc::new(VideoHandle { local_path, info });
        self.cache.insert(url, Arc::clone(&handle));
        Ok(handle)
    }
}

/// Best-effort background warmer for the video cache.
pub struct VideoPrefetcher {
    loader: Arc<VideoUrlLoader>,
    quality: QualityPreset,
}

impl VideoPrefetcher {
    pub fn new(loader: Arc<VideoUrlLoader>, quality: QualityPreset) -> Self {
        Self { loader, quality }
    }

    /// Warm the cache for `url`. Fire-and-forget: failures are logged and
    /// swallowed, and never block or propagate to foreground work.
    pub fn warm(&self, url: &str) {
        let loader = Arc::clone(&self.loader);
        let quality = self.quality;
        let url = url.to_string();
        tokio::spawn(async move {
            match loader.load(&url, quality).await {
                Ok(_) => debug!(url = %url, "video prefetched"),
                Err(e) => warn!(url = %url, error = %e, "video prefetch failed"),
            }
        });
    }
}
