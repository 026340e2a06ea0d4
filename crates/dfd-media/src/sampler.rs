//! Evenly spaced frame sampling.
//!
//! [`FrameSampler`] walks a [`VideoDecoder`] once, front to back, and yields
//! every `interval`-th decoded frame. Skipped frames are decoded into a
//! scratch buffer and dropped, so at most one frame is held at a time no
//! matter how long the video is.

use image::RgbImage;
use std::num::NonZeroU32;
use tracing::{debug, warn};

use crate::decoder::VideoDecoder;
use crate::error::{MediaError, MediaResult};

/// Default stride between sampled frames.
pub const DEFAULT_FRAME_INTERVAL: u32 = 10;

/// A decoded frame selected by the sampler.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// 0-based position among all decoded frames
    pub ordinal: u64,
    pub image: RgbImage,
}

/// Validate a sampling interval.
pub fn frame_interval(interval: u32) -> MediaResult<NonZeroU32> {
    NonZeroU32::new(interval)
        .ok_or_else(|| MediaError::invalid_config("frame interval must be a positive integer"))
}

/// Lazy, finite, non-restartable sequence of sampled frames.
///
/// Owns the decoder; dropping the sampler releases it.
pub struct FrameSampler<D: VideoDecoder> {
    decoder: D,
    interval: u64,
    /// `floor(total_frames / interval)`
    target: u64,
    yielded: u64,
    /// Ordinal of the next frame the decoder will produce
    next_ordinal: u64,
    finished: bool,
}

impl<D: VideoDecoder> FrameSampler<D> {
    /// Sample every `interval`-th frame of `decoder`.
    pub fn new(decoder: D, interval: NonZeroU32) -> Self {
        let interval = u64::from(interval.get());
        let target = decoder.total_frames() / interval;

        debug!(
            total_frames = decoder.total_frames(),
            interval,
            target,
            "Frame sampler created"
        );

        Self {
            decoder,
            interval,
            target,
            yielded: 0,
            next_ordinal: 0,
            finished: target == 0,
        }
    }

    /// Number of frames the sampler aims to yield.
    pub fn target(&self) -> u64 {
        self.target
    }

    fn end_of_stream(&mut self, reason: &str) {
        if self.yielded < self.target {
            debug!(
                yielded = self.yielded,
                target = self.target,
                decoded = self.next_ordinal,
                "Decoder ended before sampling target: {}",
                reason
            );
        }
        self.finished = true;
    }
}

impl<D: VideoDecoder> Iterator for FrameSampler<D> {
    type Item = SampledFrame;

    fn next(&mut self) -> Option<SampledFrame> {
        if self.finished {
            return None;
        }

        // Skip up to the next multiple of the interval.
        while self.next_ordinal % self.interval != 0 {
            match self.decoder.skip_frame() {
                Ok(true) => self.next_ordinal += 1,
                Ok(false) => {
                    self.end_of_stream("end of stream");
                    return None;
                }
                Err(e) => {
                    warn!(ordinal = self.next_ordinal, "Decode error, ending sampling: {}", e);
                    self.end_of_stream("decode error");
                    return None;
                }
            }
        }

        let ordinal = self.next_ordinal;
        match self.decoder.read_frame() {
            Ok(Some(image)) => {
                self.next_ordinal += 1;
                self.yielded += 1;
                if self.yielded >= self.target {
                    self.finished = true;
                }
                Some(SampledFrame { ordinal, image })
            }
            Ok(None) => {
                self.end_of_stream("end of stream");
                None
            }
            Err(e) => {
                warn!(ordinal, "Decode error, ending sampling: {}", e);
                self.end_of_stream("decode error");
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.target.saturating_sub(self.yielded);
        (0, usize::try_from(remaining).ok())
    }
}

impl<D: VideoDecoder> std::iter::FusedIterator for FrameSampler<D> {}
