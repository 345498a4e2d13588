//! Encode side of the transcode pipeline.

use crate::transcode::{read_log_tail, TargetGeometry, TranscodeSpec};
use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Encoder process consuming raw planar YUV frames and producing H.264 in an
/// MP4 container at the spec's resolution, bitrate, and orientation.
pub(crate) struct FrameWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    log_path: PathBuf,
}

impl FrameWriter {
    pub fn spawn(
        output: &Path,
        natural_size: (u32, u32),
        geometry: &TargetGeometry,
        spec: &TranscodeSpec,
        frame_rate: f64,
        log: File,
        log_path: PathBuf,
    ) -> Result<Self> {
        let is_mp4 = output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
        if !is_mp4 {
            return Err(Error::writer_init(format!(
                "unsupported output path: {}",
                output.display()
            )));
        }

        let (width, height) = natural_size;
        let mut filter = format!("scale={}:{}", geometry.width, geometry.height);
        if geometry.transpose {
            filter.push_str(",transpose=1");
        }

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-f", "rawvideo", "-pix_fmt", "yuv420p"])
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .arg("-framerate")
            .arg(format!("{:.3}", frame_rate))
            .args(["-i", "pipe:0", "-vf"])
            .arg(filter)
            .args(["-c:v", "libx264", "-profile:v"])
            .arg(&spec.h264_profile)
            .arg("-b:v")
            .arg(spec.bitrate_bps.to_string())
            .arg("-g")
            .arg(spec.max_keyframe_interval.to_string())
            // B-frames off: samples must keep strict source order.
            .args(["-bf", "0", "-pix_fmt", "yuv420p", "-movflags", "+faststart", "-y"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(log)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::writer_init(e.to_string())
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::writer_init("encoder stdin unavailable"))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            log_path,
        })
    }

    /// Append one raw frame. The write blocks while the encoder's input pipe
    /// is full; that blocking is the backpressure gate of the pump loop.
    pub fn append(&mut self, frame: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::encoder_failed("encoder input already finished"))?;
        stdin.write_all(frame).map_err(|e| {
            Error::encoder_failed(format!(
                "encoder rejected frame: {}: {}",
                e,
                read_log_tail(&self.log_path)
            ))
        })
    }

    /// Mark the input finished and await the encoder's terminal status.
    pub fn finish(&mut self) -> Result<()> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::encoder_failed(format!(
                "encoder exited with {}: {}",
                status,
                read_log_tail(&self.log_path)
            )));
        }
        Ok(())
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
