//! FFmpeg command builder for raw frame decoding.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for an FFmpeg process that writes decoded frames to stdout.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command reading from `input`.
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Decode every frame of the first video stream as packed RGB24 to stdout.
    ///
    /// Frames keep their coded size and timing: no autorotation, no frame
    /// duplication or dropping.
    pub fn rgb24_frames(input: impl AsRef<Path>) -> Self {
        Self::new(input)
            .input_arg("-noautorotate")
            .output_args(["-map", "0:v:0", "-vsync", "0", "-an", "-sn"])
            .output_args(["-pix_fmt", "rgb24", "-f", "rawvideo"])
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        // Output goes to stdout
        args.push("-".to_string());

        args
    }

    /// Spawn FFmpeg with stdout piped.
    ///
    /// Stderr is discarded: a corrupt stream can log one line per frame and a
    /// full stderr pipe would stall the decoder.
    pub fn spawn(&self) -> MediaResult<Child> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(child)
    }
}
