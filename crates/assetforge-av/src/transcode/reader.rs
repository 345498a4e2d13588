//! Demand-driven decode side of the transcode pipeline.

use crate::transcode::read_log_tail;
use crate::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Byte length of one planar YUV 4:2:0 frame at the given natural size.
pub(crate) fn yuv420_frame_len(width: u32, height: u32) -> usize {
    let luma = width as usize * height as usize;
    let chroma = width.div_ceil(2) as usize * height.div_ceil(2) as usize;
    luma + 2 * chroma
}

/// Decoder process emitting raw planar YUV frames for the first video track.
///
/// Frames are pulled one at a time on demand; nothing is buffered beyond the
/// pipe itself, so the reader never races ahead of the writer.
pub(crate) struct FrameReader {
    child: Child,
    stdout: ChildStdout,
    frame_len: usize,
    log_path: PathBuf,
}

impl FrameReader {
    pub fn spawn(
        input: &Path,
        width: u32,
        height: u32,
        log: File,
        log_path: PathBuf,
    ) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(input)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "yuv420p", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(log)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::reader_init(e.to_string())
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::reader_init("decoder stdout unavailable"))?;

        Ok(Self {
            child,
            stdout,
            frame_len: yuv420_frame_len(width, height),
            log_path,
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Pull the next decoded frame into `buf`, returning `false` on a clean
    /// end of stream. A stream that ends between frame boundaries means the
    /// decoder died mid-clip.
    pub fn next_frame(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .stdout
                .read(&mut buf[filled..])
                .map_err(|e| Error::encoder_failed(format!("decoder read failed: {}", e)))?;
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(Error::encoder_failed(format!(
                    "decoder stream ended mid-frame ({} of {} bytes): {}",
                    filled,
                    buf.len(),
                    read_log_tail(&self.log_path)
                )));
            }
            filled += n;
        }
        Ok(true)
    }

    /// Reap the decoder after a clean end of stream.
    pub fn finish(&mut self) -> Result<()> {
        let status = self.child.wait()?;
        if !status.success() {
            return Err(Error::encoder_failed(format!(
                "decoder exited with {}: {}",
                status,
                read_log_tail(&self.log_path)
            )));
        }
        Ok(())
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        // Abandoned pipelines must not leak the decoder process.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len_even_dimensions() {
        // 4:2:0 is 1.5 bytes per pixel at even sizes.
        assert_eq!(yuv420_frame_len(1920, 1080), 1920 * 1080 * 3 / 2);
        assert_eq!(yuv420_frame_len(2, 2), 6);
    }

    #[test]
    fn test_frame_len_odd_dimensions() {
        // Chroma planes round up per axis.
        assert_eq!(yuv420_frame_len(3, 3), 9 + 2 * 4);
        assert_eq!(yuv420_frame_len(641, 480), 641 * 480 + 2 * (321 * 240));
    }
}
