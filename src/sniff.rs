//! Media kind classification.
//!
//! Extension hints are trusted when recognized, which avoids reading large
//! buffers on the cheap path. When the hint is absent or unrecognized the
//! buffer is inspected for the WebP container signature. Delivery pipelines
//! frequently mislabel WebP content with generic extensions, so that check is
//! byte-exact rather than extension-driven.
//!
//! Classification is deterministic and side-effect-free; it is cheap enough
//! to run on every conversion and is never cached.

/// Classified kind of a media buffer. Derived, never persisted; recomputed
/// from bytes and hints on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A still raster image (JPEG, PNG, or anything decodable as one).
    StillImage,
    /// An animated GIF; re-encoding would destroy the animation.
    AnimatedImage,
    /// WebP container; passed through verbatim.
    WebP,
    /// Unclassified; callers fall back to a generic raster decode.
    Unknown,
}

impl MediaKind {
    /// Map a recognized type hint to a kind.
    ///
    /// Accepts a bare extension ("webp"), a file name ("photo.webp"), or a
    /// MIME type ("image/webp"); only the final token is considered.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let token = hint.rsplit('/').next().unwrap_or(hint);
        let token = token.rsplit('.').next().unwrap_or(token);
        match token.to_ascii_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::AnimatedImage),
            "jpg" | "jpeg" | "png" => Some(Self::StillImage),
            _ => None,
        }
    }
}

/// WebP container signature: ASCII "RIFF" at [0..4) and "WEBP" at [8..12).
pub fn has_webp_signature(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

/// Classify a buffer, trusting a recognized hint first, then falling back to
/// signature inspection.
pub fn classify(bytes: &[u8], hint: Option<&str>) -> MediaKind {
    if let Some(kind) = hint.and_then(MediaKind::from_hint) {
        return kind;
    }
    if has_webp_signature(bytes) {
        return MediaKind::WebP;
    }
    MediaKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webp_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WEBP");
        bytes.extend_from_slice(b"VP8 ");
        bytes
    }

    #[test]
    fn extension_hint_wins() {
        assert_eq!(classify(b"arbitrary", Some("webp")), MediaKind::WebP);
        assert_eq!(classify(b"arbitrary", Some("GIF")), MediaKind::AnimatedImage);
        assert_eq!(classify(b"arbitrary", Some("jpg")), MediaKind::StillImage);
        assert_eq!(classify(b"arbitrary", Some("jpeg")), MediaKind::StillImage);
        assert_eq!(classify(b"arbitrary", Some("png")), MediaKind::StillImage);
    }

    #[test]
    fn hint_accepts_file_names_and_mime_types() {
        assert_eq!(MediaKind::from_hint("photo.webp"), Some(MediaKind::WebP));
        assert_eq!(MediaKind::from_hint("image/gif"), Some(MediaKind::AnimatedImage));
        assert_eq!(MediaKind::from_hint("image/jpeg"), Some(MediaKind::StillImage));
        assert_eq!(MediaKind::from_hint("application/octet-stream"), None);
    }

    #[test]
    fn signature_classifies_unhinted_webp() {
        assert_eq!(classify(&webp_bytes(), None), MediaKind::WebP);
        assert_eq!(classify(&webp_bytes(), Some("bin")), MediaKind::WebP);
    }

    #[test]
    fn signature_check_is_byte_exact() {
        let mut bytes = webp_bytes();
        bytes[9] = b'A';
        assert!(!has_webp_signature(&bytes));
        assert_eq!(classify(&bytes, None), MediaKind::Unknown);
    }

    #[test]
    fn short_buffer_without_hint_is_unknown() {
        assert_eq!(classify(b"RIFF1234WEB", None), MediaKind::Unknown);
        assert_eq!(classify(&[], None), MediaKind::Unknown);
    }
}
