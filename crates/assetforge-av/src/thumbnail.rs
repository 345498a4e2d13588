//! Still-frame capture from video files.

use crate::{tools, Error, Result};
use std::path::Path;
use std::process::Command;

/// Capture a JPEG still from the start of a video file.
///
/// Used after a successful transcode to populate the thumbnail slot of a
/// video selection; callers treat failures as "no thumbnail", not as a
/// conversion failure.
pub fn capture_frame(path: &Path) -> Result<Vec<u8>> {
    tools::require_tool("ffmpeg")?;

    let out = tempfile::Builder::new()
        .prefix("assetforge-thumb-")
        .suffix(".jpg")
        .tempfile()?
        .into_temp_path();

    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-ss", "0", "-i"])
        .arg(path)
        .args(["-frames:v", "1", "-q:v", "2", "-f", "image2", "-y"])
        .arg(&out)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::invalid_asset(
            path,
            format!("thumbnail capture failed: {}", stderr.trim()),
        ));
    }

    let bytes = std::fs::read(&out)?;
    if bytes.is_empty() {
        return Err(Error::invalid_asset(path, "thumbnail capture produced no image"));
    }
    Ok(bytes)
}
