//! Sequential video decoding.
//!
//! A [`VideoDecoder`] is a forward-only cursor over the decoded frames of one
//! container. [`FfmpegDecoder`] backs it with an FFmpeg child process that
//! streams raw RGB24 frames over a pipe; the process is killed and reaped
//! when the decoder is dropped, whatever the exit path.

use image::RgbImage;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout};
use tracing::{debug, warn};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// Forward-only source of decoded frames.
pub trait VideoDecoder {
    /// Frame count reported by the container (may be an estimate).
    fn total_frames(&self) -> u64;

    /// Width and height of decoded frames.
    fn dimensions(&self) -> (u32, u32);

    /// Decode the next frame. `Ok(None)` marks end of stream.
    fn read_frame(&mut self) -> MediaResult<Option<RgbImage>>;

    /// Advance past the next frame without keeping it.
    ///
    /// Returns `false` at end of stream.
    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.read_frame()?.is_some())
    }
}

/// FFmpeg-backed decoder reading RGB24 frames from a pipe.
pub struct FfmpegDecoder {
    child: Child,
    stdout: ChildStdout,
    info: VideoInfo,
    frame_len: usize,
    /// Reused for skipped frames
    scratch: Vec<u8>,
    frames_read: u64,
}

impl FfmpegDecoder {
    /// Probe and open a video container.
    ///
    /// Fails with `NotFound` for a missing path and `Decode` when the
    /// container cannot be opened at all.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path)?;

        let frame_len = frame_len(info.width, info.height)?;

        let mut child = FfmpegCommand::rgb24_frames(path).spawn()?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MediaError::decode("Failed to capture FFmpeg stdout"));
            }
        };

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            total_frames = info.total_frames,
            codec = %info.codec,
            "Opened video decoder"
        );

        Ok(Self {
            child,
            stdout,
            info,
            frame_len,
            scratch: vec![0u8; frame_len],
            frames_read: 0,
        })
    }

    /// Probe information for the open container.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Fill `buf` with the next frame. Returns `false` at end of stream.
    fn fill<R: Read>(stdout: &mut R, buf: &mut [u8], frame: u64) -> MediaResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(MediaError::decode(format!(
                        "Failed to read frame {} from FFmpeg: {}",
                        frame, e
                    )))
                }
            }
        }

        if filled == buf.len() {
            return Ok(true);
        }
        if filled > 0 {
            warn!(
                frame,
                bytes = filled,
                expected = buf.len(),
                "Discarding truncated trailing frame"
            );
        }
        Ok(false)
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn read_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        let mut buf = vec![0u8; self.frame_len];
        if !Self::fill(&mut self.stdout, &mut buf, self.frames_read)? {
            return Ok(None);
        }
        self.frames_read += 1;

        RgbImage::from_raw(self.info.width, self.info.height, buf)
            .map(Some)
            .ok_or_else(|| MediaError::decode("Frame buffer does not match frame dimensions"))
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        if !Self::fill(&mut self.stdout, &mut self.scratch, self.frames_read)? {
            return Ok(false);
        }
        self.frames_read += 1;
        Ok(true)
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        // Already exited at end of stream; kill is a no-op error then.
        let _ = self.child.kill();
        match self.child.wait() {
            Ok(status) => debug!(
                frames_read = self.frames_read,
                status = ?status.code(),
                "Released video decoder"
            ),
            Err(e) => warn!("Failed to reap FFmpeg decoder process: {}", e),
        }
    }
}

/// Byte length of one packed RGB24 frame.
fn frame_len(width: u32, height: u32) -> MediaResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .filter(|&len| len > 0)
        .ok_or_else(|| MediaError::decode(format!("Invalid frame size {}x{}", width, height)))
}
