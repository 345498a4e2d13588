//! FFprobe-based source inspection.
//!
//! The transcode pipeline only ever operates on a single video track, so the
//! probe surface is deliberately small: container duration, and the first
//! video stream's codec, natural size, and frame rate.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// Metadata for a probed media source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Path the probe ran against.
    pub path: PathBuf,
    /// Container-level duration, if the format declares one.
    pub duration: Option<Duration>,
    /// The first video stream, if any.
    pub video: Option<VideoStream>,
}

/// A single video stream as reported by ffprobe.
#[derive(Debug, Clone)]
pub struct VideoStream {
    /// Codec name (e.g. "h264").
    pub codec: String,
    /// Natural width in pixels, pre-rotation.
    pub width: u32,
    /// Natural height in pixels, pre-rotation.
    pub height: u32,
    /// Declared frame rate, if parseable.
    pub frame_rate: Option<f64>,
}

impl SourceInfo {
    /// Formatted duration label, if the container declares a duration.
    pub fn duration_label(&self) -> Option<String> {
        self.duration.map(duration_label)
    }
}

/// Probe a media file using ffprobe.
///
/// A missing ffprobe binary is reported as `ToolNotFound`; a source ffprobe
/// cannot read is reported as `InvalidAsset`.
pub fn probe(path: &Path) -> Result<SourceInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffprobe")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::invalid_asset(path, stderr.trim().to_string()));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    let ff_output: FfprobeOutput = serde_json::from_str(&json_str)?;

    Ok(parse_ffprobe_output(path, ff_output))
}

/// Probe a media file and require a playable video track.
///
/// This is the validation step the transcode pipeline runs before allocating
/// any reader or writer resources.
pub fn validate(path: &Path) -> Result<SourceInfo> {
    let info = probe(path)?;
    if info.video.is_none() {
        return Err(Error::invalid_asset(path, "no video track"));
    }
    Ok(info)
}

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> SourceInfo {
    let duration = output
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64);

    let video = output
        .streams
        .into_iter()
        .find(|s| s.codec_type == "video")
        .map(|stream| VideoStream {
            codec: stream.codec_name.unwrap_or_default(),
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
            frame_rate: stream.r_frame_rate.and_then(|s| parse_frame_rate(&s)),
        });

    SourceInfo {
        path: path.to_path_buf(),
        duration,
        video,
    }
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
    }
    rate_str.parse().ok()
}

/// Format a duration as a playback label: `m:ss`, or `h:mm:ss` at an hour or
/// more.
pub fn duration_label(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
