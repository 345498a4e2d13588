//! # assetforge-av
//!
//! Video probing and transcoding for the assetforge pipeline.
//!
//! This crate provides functionality for:
//! - Probing media files to extract metadata (duration, natural size, codec)
//! - Transcoding a single video track through a demand-driven reader→writer
//!   pipeline with preset resolution/bitrate bounds and portrait
//!   orientation normalization
//! - Capturing still-frame thumbnails
//!
//! Everything here is synchronous and CPU/IO bound; async callers run these
//! operations on blocking workers.
//!
//! ## Example
//!
//! ```no_run
//! use assetforge_av::{QualityPreset, Transcoder, TranscodeSpec};
//!
//! let info = assetforge_av::probe("/path/to/clip.mov")?;
//! println!("duration: {:?}", info.duration);
//!
//! let transcoder = Transcoder::new(TranscodeSpec::preset(QualityPreset::Medium));
//! transcoder.transcode("/path/to/clip.mov".as_ref(), "/tmp/out.mp4".as_ref())?;
//! # Ok::<(), assetforge_av::Error>(())
//! ```

mod error;
pub mod probe;
pub mod thumbnail;
pub mod tools;
pub mod transcode;

// Re-exports
pub use error::{CompressionFailure, Error, Result};
pub use probe::{duration_label, SourceInfo, VideoStream};
pub use thumbnail::capture_frame;
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use transcode::{QualityPreset, TargetGeometry, Transcoder, TranscodeSpec};

/// Probe a media file and return its metadata.
///
/// This is the main entry point for probing files.
pub fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<SourceInfo> {
    probe::probe(path.as_ref())
}

/// Probe a media file and require a playable video track.
pub fn validate<P: AsRef<std::path::Path>>(path: P) -> Result<SourceInfo> {
    probe::validate(path.as_ref())
}
