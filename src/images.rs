//! Image normalization: bounded downsampling and canonical re-encoding.
//!
//! Sources that decode as raster images are scaled down to a long-edge bound
//! (never up) and re-encoded as JPEG. WebP and animated GIF buffers are kept
//! verbatim, since re-encoding either would lose the container's value; a
//! representative frame is still decoded for the cache slot.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::error::{ConvertError, Result};
use crate::sniff::{self, MediaKind};

/// Options governing normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Long-edge bound for downsampling. Never used to upscale.
    pub max_dimension: u32,
    /// JPEG re-encode quality in `0.0..=1.0`.
    pub jpeg_quality: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            jpeg_quality: 0.8,
        }
    }
}

/// Result of normalizing one image buffer.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Canonical encoded bytes; equal to the input for passthrough kinds.
    pub encoded: Vec<u8>,
    /// Id suffix matching the true byte format.
    pub suffix: &'static str,
    /// Decoded representative frame for the cache slot.
    pub decoded: Option<Arc<DynamicImage>>,
}

/// Compute the downsample factor for a source. Clamped to 1.0; sources are
/// never upscaled.
pub fn downsample_scale(width: u32, height: u32, max_dimension: u32) -> f64 {
    let max = max_dimension as f64;
    (max / width as f64).min(max / height as f64).min(1.0)
}

/// Normalize an image buffer into its canonical representation.
///
/// The WebP signature always wins over the hinted kind: mislabeled WebP
/// content must come out suffixed `.webp` with its bytes untouched.
pub fn normalize(bytes: &[u8], kind: MediaKind, options: &NormalizeOptions) -> Result<NormalizedImage> {
    let kind = if sniff::has_webp_signature(bytes) {
        MediaKind::WebP
    } else {
        kind
    };

    match kind {
        MediaKind::WebP => Ok(NormalizedImage {
            encoded: bytes.to_vec(),
            suffix: ".webp",
            decoded: decode_lenient(bytes),
        }),
        MediaKind::AnimatedImage => Ok(NormalizedImage {
            encoded: bytes.to_vec(),
            suffix: ".gif",
            decoded: decode_lenient(bytes),
        }),
        MediaKind::StillImage | MediaKind::Unknown => reencode_jpeg(bytes, options),
    }
}

/// Probe dimensions from the container header without a full decode.
fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ConvertError::decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ConvertError::decode(e.to_string()))
}

/// Decode a representative frame, tolerating failure. Passthrough kinds keep
/// their bytes either way; the decoded handle is an optimization.
fn decode_lenient(bytes: &[u8]) -> Option<Arc<DynamicImage>> {
    image::load_from_memory(bytes).ok().map(Arc::new)
}

fn reencode_jpeg(bytes: &[u8], options: &NormalizeOptions) -> Result<NormalizedImage> {
    let (width, height) = probe_dimensions(bytes)?;
    if width == 0 || height == 0 {
        return Err(ConvertError::decode("source reports zero dimensions"));
    }

    let scale = downsample_scale(width, height, options.max_dimension);
    let img = image::load_from_memory(bytes).map_err(|e| ConvertError::decode(e.to_string()))?;
    let img = if scale < 1.0 {
        let target_w = ((width as f64 * scale).round() as u32).max(1);
        let target_h = ((height as f64 * scale).round() as u32).max(1);
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    } else {
        img
    };

    let quality = (options.jpeg_quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| ConvertError::encode(e.to_string()))?;

    Ok(NormalizedImage {
        encoded: buf.into_inner(),
        suffix: ".jpg",
        decoded: Some(Arc::new(rgb)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{ImageFormat, RgbImage};

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();
        buf.into_inner()
    }

    fn webp_signature_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(b"VP8 payload");
        bytes
    }

    #[test]
    fn test_downsample_scale_law() {
        assert_eq!(downsample_scale(2048, 1365, 2048), 1.0);
        assert!(downsample_scale(3000, 2000, 2048) < 1.0);
        // Small sources are never upscaled.
        assert_eq!(downsample_scale(100, 50, 2048), 1.0);
    }

    #[test]
    fn test_normalize_downsamples_to_bound() {
        let bytes = jpeg_bytes(300, 200);
        let options = NormalizeOptions {
            max_dimension: 64,
            ..Default::default()
        };
        let out = normalize(&bytes, MediaKind::StillImage, &options).unwrap();
        assert_eq!(out.suffix, ".jpg");
        let decoded = out.decoded.unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 43);
    }

    #[test]
    fn test_normalize_is_idempotent_on_dimensions() {
        let bytes = jpeg_bytes(300, 200);
        let options = NormalizeOptions {
            max_dimension: 64,
            ..Default::default()
        };
        let first = normalize(&bytes, MediaKind::StillImage, &options).unwrap();
        let second = normalize(&first.encoded, MediaKind::StillImage, &options).unwrap();
        let a = first.decoded.unwrap();
        let b = second.decoded.unwrap();
        assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    }

    #[test]
    fn test_normalize_never_upscales() {
        let bytes = jpeg_bytes(40, 30);
        let out = normalize(&bytes, MediaKind::StillImage, &NormalizeOptions::default()).unwrap();
        let decoded = out.decoded.unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_webp_signature_passthrough() {
        // Hinted as a still image, but the signature wins: bytes unchanged,
        // suffix .webp.
        let bytes = webp_signature_bytes();
        let out = normalize(&bytes, MediaKind::StillImage, &NormalizeOptions::default()).unwrap();
        assert_eq!(out.suffix, ".webp");
        assert_eq!(out.encoded, bytes);
    }

    #[test]
    fn test_gif_passthrough_keeps_bytes() {
        let mut raw = Vec::new();
        {
            let mut encoder = image::codecs::gif::GifEncoder::new(&mut raw);
            let frame = image::Frame::new(image::RgbaImage::from_pixel(
                4,
                4,
                image::Rgba([0, 255, 0, 255]),
            ));
            encoder.encode_frame(frame).unwrap();
        }
        let out = normalize(&raw, MediaKind::AnimatedImage, &NormalizeOptions::default()).unwrap();
        assert_eq!(out.suffix, ".gif");
        assert_eq!(out.encoded, raw);
        // A representative still frame is decoded for the cache slot.
        assert!(out.decoded.is_some());
    }

    #[test]
    fn test_corrupt_bytes_are_a_decode_error() {
        let err = normalize(
            b"definitely not an image",
            MediaKind::Unknown,
            &NormalizeOptions::default(),
        )
        .unwrap_err();
        assert_matches!(err, ConvertError::Decode(_));
    }

    #[test]
    fn test_truncated_jpeg_is_a_decode_error() {
        let mut bytes = jpeg_bytes(100, 100);
        bytes.truncate(bytes.len() / 4);
        let result = normalize(&bytes, MediaKind::StillImage, &NormalizeOptions::default());
        assert_matches!(result, Err(ConvertError::Decode(_)));
    }
}
