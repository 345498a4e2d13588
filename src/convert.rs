//! Conversion orchestration.
//!
//! The converter receives an opaque asset reference, dispatches on its
//! declared kind, and drives sniffing, normalization, transcoding, and cache
//! population to produce a canonical selection. Heavy work runs on blocking
//! workers; nothing here retries, and transient collaborator failures surface
//! to the caller as-is.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use assetforge_av::{QualityPreset, Transcoder, TranscodeSpec};

use crate::cache::{self, ImageCache, VideoCache, VIDEO_CACHE_CAPACITY};
use crate::error::{ConvertError, Result};
use crate::images::{self, NormalizeOptions};
use crate::selection::{ImageSelection, Selection, VideoSelection};
use crate::sniff;
use crate::source::{self, AssetLibrary, AssetLocation, AssetRef, CachedHttpFetcher, DeclaredKind, UrlFetcher};
use crate::video::{VideoPrefetcher, VideoUrlLoader};

/// Tuning for one converter instance.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    pub normalize: NormalizeOptions,
    pub video_quality: QualityPreset,
    /// Directory for downloaded, copied, and transcoded files. Selections
    /// keep pointing into it; see [`source::sweep_scratch`] for reclamation.
    pub scratch_dir: PathBuf,
    /// Load the full container bytes into video selections.
    pub keep_raw_bytes: bool,
    /// Approximate byte budget for the decoded-image cache.
    pub image_cache_budget: usize,
    pub video_cache_capacity: usize,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            video_quality: QualityPreset::Medium,
            scratch_dir: std::env::temp_dir().join("assetforge"),
            keep_raw_bytes: false,
            image_cache_budget: 256 * 1024 * 1024,
            video_cache_capacity: VIDEO_CACHE_CAPACITY,
        }
    }
}

/// Façade over the conversion pipeline.
pub struct AssetConverter {
    library: Option<Arc<dyn AssetLibrary>>,
    fetcher: Arc<dyn UrlFetcher>,
    images: Arc<ImageCache>,
    videos: Arc<VideoCache>,
    loader: Arc<VideoUrlLoader>,
    options: ConverterOptions,
}

impl AssetConverter {
    /// Create a converter backed by the default HTTP fetcher.
    pub fn new(options: ConverterOptions) -> Self {
        Self::with_fetcher(options, Arc::new(CachedHttpFetcher::new()))
    }

    /// Create a converter with an explicit URL fetcher.
    pub fn with_fetcher(options: ConverterOptions, fetcher: Arc<dyn UrlFetcher>) -> Self {
        let images = Arc::new(ImageCache::with_weight_budget(options.image_cache_budget));
        let videos = Arc::new(VideoCache::with_capacity(options.video_cache_capacity));
        let loader = Arc::new(VideoUrlLoader::new(
            Arc::clone(&fetcher),
            Arc::clone(&videos),
            options.scratch_dir.clone(),
        ));
        Self {
            library: None,
            fetcher,
            images,
            videos,
            loader,
            options,
        }
    }

    /// Attach a platform asset library collaborator.
    pub fn with_library(mut self, library: Arc<dyn AssetLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    /// Decoded-image cache shared by all pipeline stages.
    pub fn image_cache(&self) -> Arc<ImageCache> {
        Arc::clone(&self.images)
    }

    /// Opened-video-handle cache shared by loader and prefetcher.
    pub fn video_cache(&self) -> Arc<VideoCache> {
        Arc::clone(&self.videos)
    }

    /// Prefetcher warming the video cache over the foreground load path.
    pub fn prefetcher(&self) -> VideoPrefetcher {
        VideoPrefetcher::new(Arc::clone(&self.loader), self.options.video_quality)
    }

    /// Convert one asset into its canonical selection.
    pub async fn convert(&self, asset: AssetRef) -> Result<Selection> {
        match asset.kind {
            DeclaredKind::Image => Ok(Selection::Image(self.convert_image(asset.location).await?)),
            DeclaredKind::Video => Ok(Selection::Video(self.convert_video(asset.location).await?)),
            DeclaredKind::Other(kind) => Err(ConvertError::UnsupportedType(kind)),
        }
    }

    async fn convert_image(&self, location: AssetLocation) -> Result<ImageSelection> {
        let (bytes, type_hint, source_path) = match location {
            AssetLocation::Library { id } => {
                let payload = self.require_library()?.fetch_image_bytes(&id).await?;
                (payload.bytes, payload.type_hint, None)
            }
            AssetLocation::Url(url) => {
                let bytes = self.fetcher.fetch(&url).await?;
                (bytes, extension_hint(&url), Some(url))
            }
            AssetLocation::File(path) => {
                let bytes = tokio::fs::read(&path).await?;
                let hint = path.extension().and_then(|e| e.to_str()).map(str::to_string);
                (
                    Bytes::from(bytes),
                    hint,
                    Some(path.to_string_lossy().into_owned()),
                )
            }
        };

        let kind = sniff::classify(&bytes, type_hint.as_deref());
        let normalize_options = self.options.normalize.clone();
        let normalized =
            tokio::task::spawn_blocking(move || images::normalize(&bytes, kind, &normalize_options))
                .await
                .map_err(|e| ConvertError::internal(e.to_string()))??;

        let id = format!("{}{}", Uuid::new_v4(), normalized.suffix);

        // Cache population is an optimization, never a correctness
        // dependency; nothing here can fail the conversion.
        if let Some(ref decoded) = normalized.decoded {
            self.images
                .insert_weighted(id.as_str(), Arc::clone(decoded), cache::image_weight(decoded));
        }

        Ok(ImageSelection {
            id,
            encoded: normalized.encoded,
            decoded: normalized.decoded,
            source_path,
        })
    }

    async fn convert_video(&self, location: AssetLocation) -> Result<VideoSelection> {
        let scratch_dir = self.options.scratch_dir.clone();
        tokio::fs::create_dir_all(&scratch_dir).await?;

        let (local_path, source_url, id_stem) = match location {
            AssetLocation::Library { id } => {
                let payload = self.require_library()?.fetch_video(&id).await?;
                let src = payload.local_path;
                let scratch = scratch_dir.clone();
                let local =
                    tokio::task::spawn_blocking(move || source::copy_to_local_storage(&src, &scratch))
                        .await
                        .map_err(|e| ConvertError::internal(e.to_string()))??;
                (local, payload.source_url, id)
            }
            AssetLocation::Url(url) => {
                let handle = self.loader.load(&url, self.options.video_quality).await?;
                (handle.local_path.clone(), Some(url), Uuid::new_v4().to_string())
            }
            AssetLocation::File(path) => {
                let scratch = scratch_dir.clone();
                let src = path.clone();
                let local =
                    tokio::task::spawn_blocking(move || source::copy_to_local_storage(&src, &scratch))
                        .await
                        .map_err(|e| ConvertError::internal(e.to_string()))??;
                (local, None, Uuid::new_v4().to_string())
            }
        };

        // Validate before any pipeline resource exists, and decide whether
        // the requested quality is actually below the source's native one.
        let probe_path = local_path.clone();
        let info = tokio::task::spawn_blocking(move || assetforge_av::validate(&probe_path))
            .await
            .map_err(|e| ConvertError::internal(e.to_string()))??;
        let native_long_edge = info
            .video
            .as_ref()
            .map(|v| v.width.max(v.height))
            .unwrap_or(0);

        let quality = self.options.video_quality;
        let local_path = if quality.long_edge() < native_long_edge {
            let input = local_path.clone();
            let output = scratch_dir.join(source::scratch_file_name("mp4"));
            tokio::task::spawn_blocking(move || {
                let transcoder = Transcoder::new(TranscodeSpec::preset(quality));
                transcoder.transcode(&input, &output)?;
                Ok::<_, ConvertError>(output)
            })
            .await
            .map_err(|e| ConvertError::internal(e.to_string()))??
        } else {
            debug!(
                quality = %quality,
                native_long_edge = native_long_edge,
                "source within preset bound; keeping original file"
            );
            local_path
        };

        let id = format!("{}.mp4", id_stem);

        // Duration and thumbnail come from the final file's own metadata.
        let final_path = local_path.clone();
        let (duration, thumbnail_result) = tokio::task::spawn_blocking(move || {
            let duration = assetforge_av::probe(&final_path)
                .ok()
                .and_then(|i| i.duration_label());
            let thumbnail = assetforge_av::capture_frame(&final_path);
            (duration, thumbnail)
        })
        .await
        .map_err(|e| ConvertError::internal(e.to_string()))?;

        let (thumbnail, thumbnail_image) = match thumbnail_result {
            Ok(bytes) => {
                let decoded = image::load_from_memory(&bytes).ok().map(Arc::new);
                if let Some(ref img) = decoded {
                    self.images
                        .insert_weighted(id.as_str(), Arc::clone(img), cache::image_weight(img));
                }
                (Some(bytes), decoded)
            }
            Err(e) => {
                warn!(error = %e, "thumbnail capture failed");
                (None, None)
            }
        };

        let raw = if self.options.keep_raw_bytes {
            tokio::fs::read(&local_path).await.ok()
        } else {
            None
        };

        Ok(VideoSelection {
            id,
            local_path,
            raw,
            thumbnail,
            thumbnail_image,
            duration,
            source_url,
        })
    }

    fn require_library(&self) -> Result<&Arc<dyn AssetLibrary>> {
        self.library
            .as_ref()
            .ok_or_else(|| ConvertError::source("no asset library configured"))
    }
}

/// Extension hint from the path portion of a URL.
fn extension_hint(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_extension_hint() {
        assert_eq!(
            extension_hint("https://cdn.example.com/a/photo.webp?sig=1"),
            Some("webp".to_string())
        );
        assert_eq!(
            extension_hint("https://example.com/clip.mp4#t=1"),
            Some("mp4".to_string())
        );
        assert_eq!(extension_hint("https://example.com/noext"), None);
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_rejected() {
        let converter = AssetConverter::new(ConverterOptions::default());
        let asset = AssetRef::new(
            DeclaredKind::Other("audio".to_string()),
            AssetLocation::Url("https://example.com/a.mp3".to_string()),
        );
        let err = converter.convert(asset).await.unwrap_err();
        assert_matches!(err, ConvertError::UnsupportedType(kind) if kind == "audio");
    }

    #[tokio::test]
    async fn test_library_location_requires_library() {
        let converter = AssetConverter::new(ConverterOptions::default());
        let asset = AssetRef::image(AssetLocation::Library {
            id: "asset-1".to_string(),
        });
        let err = converter.convert(asset).await.unwrap_err();
        assert_matches!(err, ConvertError::Source(_));
    }
}
