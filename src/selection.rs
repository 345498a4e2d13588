//! Canonical output records for converted assets.
//!
//! Selections are created by the orchestrator on successful normalization
//! and live exactly as long as their caller holds them. The persisted form
//! is compact: decoded in-memory handles are never serialized and are
//! reconstructed from the encoded bytes on load.

use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// A converted asset, image or video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Selection {
    Image(ImageSelection),
    Video(VideoSelection),
}

impl Selection {
    /// Stable identity of the underlying selection.
    pub fn id(&self) -> &str {
        match self {
            Self::Image(s) => &s.id,
            Self::Video(s) => &s.id,
        }
    }

    pub fn as_image(&self) -> Option<&ImageSelection> {
        match self {
            Self::Image(s) => Some(s),
            Self::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSelection> {
        match self {
            Self::Video(s) => Some(s),
            Self::Image(_) => None,
        }
    }
}

/// Canonical record for a converted image.
///
/// The id carries a format suffix matching the true byte content as sniffed
/// (`.jpg`, `.gif`, `.webp`), not merely the input extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSelection {
    pub id: String,
    /// Canonical encoded bytes; equal to the source bytes when no re-encode
    /// was needed. Never empty on a valid selection.
    pub encoded: Vec<u8>,
    /// Decoded handle. Evictable; absent after deserialization.
    #[serde(skip)]
    pub decoded: Option<Arc<DynamicImage>>,
    /// Originating path or URL, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_path: Option<String>,
}

impl ImageSelection {
    /// A selection is valid only while it owns encoded bytes.
    pub fn is_valid(&self) -> bool {
        !self.encoded.is_empty()
    }

    /// Rebuild the decoded handle from the encoded bytes, after
    /// deserialization or cache eviction.
    pub fn rehydrate(&mut self) -> Result<Arc<DynamicImage>> {
        if let Some(ref img) = self.decoded {
            return Ok(Arc::clone(img));
        }
        let img = Arc::new(
            image::load_from_memory(&self.encoded)
                .map_err(|e| ConvertError::decode(e.to_string()))?,
        );
        self.decoded = Some(Arc::clone(&img));
        Ok(img)
    }
}

impl PartialEq for ImageSelection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageSelection {}

impl std::hash::Hash for ImageSelection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Canonical record for a converted video.
///
/// `local_path` points at the canonical transcoded (or copied) file and must
/// exist for the lifetime of the selection; moving or deleting it without
/// updating the record is a contract violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSelection {
    /// Identity, always suffixed `.mp4`.
    pub id: String,
    pub local_path: PathBuf,
    /// Full container bytes; potentially large, populated only on request.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw: Option<Vec<u8>>,
    /// Encoded JPEG thumbnail.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbnail: Option<Vec<u8>>,
    /// Decoded thumbnail handle. Evictable; absent after deserialization.
    #[serde(skip)]
    pub thumbnail_image: Option<Arc<DynamicImage>>,
    /// Formatted duration label, derived from the media's own metadata.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_url: Option<String>,
}

impl PartialEq for VideoSelection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VideoSelection {}

impl std::hash::Hash for VideoSelection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
