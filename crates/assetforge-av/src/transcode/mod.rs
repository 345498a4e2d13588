//! Reader→writer transcode pipeline.
//!
//! A transcode runs as a single-producer/single-consumer pipeline: a decoder
//! process emits uncompressed planar YUV frames at the source's natural size,
//! and an encoder process consumes them at the target resolution, bitrate,
//! and orientation. The pump loop in between pulls exactly one frame at a
//! time into a reused buffer, so memory stays bounded regardless of clip
//! length. The encoder's input pipe provides the backpressure.
//!
//! Output orientation is normalized to portrait: landscape sources are
//! rotated 90° with width and height swapped rather than emitted landscape.

mod reader;
mod writer;

use crate::{probe, tools, Error, Result};
use reader::FrameReader;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use writer::FrameWriter;

/// Named quality bundle for video transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    /// 540p long edge, 1.5 Mbps.
    Low,
    /// 720p long edge, 2.5 Mbps.
    Medium,
    /// 1080p long edge, 4 Mbps.
    High,
}

impl QualityPreset {
    /// Long-edge resolution bound in pixels.
    pub fn long_edge(&self) -> u32 {
        match self {
            Self::Low => 540,
            Self::Medium => 720,
            Self::High => 1080,
        }
    }

    /// Target average bitrate in bits per second.
    pub fn bitrate_bps(&self) -> u64 {
        match self {
            Self::Low => 1_500_000,
            Self::Medium => 2_500_000,
            Self::High => 4_000_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown quality preset: {}", other)),
        }
    }
}

impl std::fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder parameters for one transcode. Pure value, no ownership
/// implications.
#[derive(Debug, Clone)]
pub struct TranscodeSpec {
    /// Long-edge resolution bound in pixels.
    pub max_edge: u32,
    /// Target average bitrate in bits per second.
    pub bitrate_bps: u64,
    /// H.264 profile handed to the encoder.
    pub h264_profile: String,
    /// GOP bound in frames.
    pub max_keyframe_interval: u32,
    /// Encoder hint only; input frame rates are not enforced.
    pub expected_frame_rate: u32,
}

impl TranscodeSpec {
    /// Build a spec from a named quality preset.
    pub fn preset(preset: QualityPreset) -> Self {
        Self {
            max_edge: preset.long_edge(),
            bitrate_bps: preset.bitrate_bps(),
            h264_profile: "high".to_string(),
            max_keyframe_interval: 60,
            expected_frame_rate: 30,
        }
    }
}

/// Encode geometry derived from a source's pre-rotation natural size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetGeometry {
    /// Scale width handed to the encoder, before any rotation.
    pub width: u32,
    /// Scale height handed to the encoder, before any rotation.
    pub height: u32,
    /// Whether the writer rotates frames 90° so the output is portrait.
    pub transpose: bool,
}

impl TargetGeometry {
    /// Compute the encode geometry for a source.
    ///
    /// The aspect ratio is held to the original natural size; landscape
    /// sources get a transpose so the container is always portrait. Scale
    /// dimensions are even-aligned for 4:2:0 chroma subsampling.
    pub fn for_source(width: u32, height: u32, max_edge: u32) -> Self {
        let (w, h) = target_size(width, height, max_edge);
        Self {
            width: align_even(w),
            height: align_even(h),
            transpose: width > height,
        }
    }

    /// Output container dimensions after any rotation is applied.
    pub fn output_size(&self) -> (u32, u32) {
        if self.transpose {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Scaled size bounded by `max_edge` on the long edge.
///
/// For a source wider than tall the target width is the preset edge and the
/// height follows the aspect ratio; otherwise the transpose of that.
pub fn target_size(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width >= height {
        let scaled = (max_edge as f64 * height as f64 / width as f64).round() as u32;
        (max_edge, scaled.max(1))
    } else {
        let scaled = (max_edge as f64 * width as f64 / height as f64).round() as u32;
        (scaled.max(1), max_edge)
    }
}

fn align_even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Read the trailing portion of a tool log for error diagnostics.
pub(crate) fn read_log_tail(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => {
            let start = bytes.len().saturating_sub(2048);
            String::from_utf8_lossy(&bytes[start..]).trim().to_string()
        }
        Err(_) => String::new(),
    }
}

/// Single-track video transcoder.
///
/// One transcoder drives one invocation at a time; concurrent invocations
/// share nothing except the caller's caches.
pub struct Transcoder {
    spec: TranscodeSpec,
    cancel: Arc<AtomicBool>,
}

impl Transcoder {
    pub fn new(spec: TranscodeSpec) -> Self {
        Self {
            spec,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the cancellation flag for external control.
    ///
    /// Setting it makes the pump loop tear down the reader and writer and
    /// report the transcode as cancelled.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Transcode `input` into a new MP4 at `output`.
    ///
    /// Validates the source before any pipeline resource is allocated. On
    /// any failure, including cancellation, no partial output file is left
    /// behind.
    pub fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        tools::require_tool("ffmpeg")?;
        tools::require_tool("ffprobe")?;

        let info = probe::validate(input)?;
        let video = info
            .video
            .ok_or_else(|| Error::invalid_asset(input, "no video track"))?;
        if video.width == 0 || video.height == 0 {
            return Err(Error::invalid_asset(input, "source reports zero dimensions"));
        }

        let result = self.run_pipeline(input, output, &video);
        if result.is_err() {
            let _ = std::fs::remove_file(output);
        }
        result
    }

    fn run_pipeline(&self, input: &Path, output: &Path, video: &probe::VideoStream) -> Result<()> {
        let geometry = TargetGeometry::for_source(video.width, video.height, self.spec.max_edge);
        let frame_rate = video
            .frame_rate
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.spec.expected_frame_rate as f64);

        let scratch = tempfile::tempdir()?;
        let decode_log = scratch.path().join("decode.log");
        let encode_log = scratch.path().join("encode.log");

        let mut reader = FrameReader::spawn(
            input,
            video.width,
            video.height,
            File::create(&decode_log)?,
            decode_log.clone(),
        )?;
        let mut writer = FrameWriter::spawn(
            output,
            (video.width, video.height),
            &geometry,
            &self.spec,
            frame_rate,
            File::create(&encode_log)?,
            encode_log.clone(),
        )?;

        debug!(
            source = %input.display(),
            width = geometry.width,
            height = geometry.height,
            transpose = geometry.transpose,
            bitrate = self.spec.bitrate_bps,
            "starting transcode"
        );

        // One reused buffer: the only uncompressed frame held at any moment.
        let mut frame = vec![0u8; reader.frame_len()];
        let mut frames: u64 = 0;
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(Error::cancelled());
            }
            if !reader.next_frame(&mut frame)? {
                break;
            }
            writer.append(&frame)?;
            frames += 1;
        }

        reader.finish()?;
        writer.finish()?;

        debug!(frames = frames, output = %output.display(), "transcode complete");
        Ok(())
    }
}
