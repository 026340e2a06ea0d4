//! Deterministic decoders and scorers for pipeline tests.

use std::cell::Cell;
use std::rc::Rc;

use image::{Rgb, RgbImage};

use crate::classifier::{FrameScorer, NormalizedImage};
use crate::decoder::VideoDecoder;
use crate::error::{MediaError, MediaResult};
use crate::sampler::SampledFrame;

pub const STUB_INPUT_SIZE: u32 = 8;

const FRAME_SIZE: u32 = 4;

/// Uniform frame whose pixels encode `ordinal % 256`.
pub fn solid_frame(ordinal: u64, width: u32, height: u32) -> SampledFrame {
    SampledFrame {
        ordinal,
        image: solid_image(ordinal, width, height),
    }
}

fn solid_image(ordinal: u64, width: u32, height: u32) -> RgbImage {
    let v = (ordinal % 256) as u8;
    RgbImage::from_pixel(width, height, Rgb([v, v, v]))
}

/// In-memory decoder producing `total` solid frames.
pub struct SyntheticDecoder {
    total: u64,
    /// Frames actually decodable (short of `total` for truncated files)
    available: u64,
    fail_at: Option<u64>,
    position: u64,
    reads: Rc<Cell<u64>>,
    released: Rc<Cell<bool>>,
}

impl SyntheticDecoder {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            available: total,
            fail_at: None,
            position: 0,
            reads: Rc::new(Cell::new(0)),
            released: Rc::new(Cell::new(false)),
        }
    }

    /// Report `total` frames but end the stream after `available`.
    pub fn truncated_at(mut self, available: u64) -> Self {
        self.available = available.min(self.total);
        self
    }

    /// Return a decode error when reaching `ordinal`.
    pub fn failing_at(mut self, ordinal: u64) -> Self {
        self.fail_at = Some(ordinal);
        self
    }

    pub fn released_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.released)
    }

    pub fn read_counter(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.reads)
    }

    fn advance(&mut self) -> MediaResult<Option<u64>> {
        if self.fail_at == Some(self.position) {
            return Err(MediaError::decode("synthetic decode failure"));
        }
        if self.position >= self.available {
            return Ok(None);
        }
        let ordinal = self.position;
        self.position += 1;
        self.reads.set(self.reads.get() + 1);
        Ok(Some(ordinal))
    }
}

impl VideoDecoder for SyntheticDecoder {
    fn total_frames(&self) -> u64 {
        self.total
    }

    fn dimensions(&self) -> (u32, u32) {
        (FRAME_SIZE, FRAME_SIZE)
    }

    fn read_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        Ok(self
            .advance()?
            .map(|ordinal| solid_image(ordinal, FRAME_SIZE, FRAME_SIZE)))
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.advance()?.is_some())
    }
}

impl Drop for SyntheticDecoder {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

/// Scorer returning the same raw score for every input.
pub struct ConstantScorer {
    raw: f32,
}

impl ConstantScorer {
    pub fn new(raw: f32) -> Self {
        Self { raw }
    }
}

impl FrameScorer for ConstantScorer {
    fn input_size(&self) -> u32 {
        STUB_INPUT_SIZE
    }

    fn score(&self, _image: &NormalizedImage) -> MediaResult<f32> {
        Ok(self.raw)
    }
}

type ScoreFn = Box<dyn Fn(&NormalizedImage) -> MediaResult<f32> + Send + Sync>;

/// Scorer delegating to a closure over the normalized image.
pub struct FnScorer {
    f: ScoreFn,
}

impl FnScorer {
    pub fn new(f: impl Fn(&NormalizedImage) -> MediaResult<f32> + Send + Sync + 'static) -> Self {
        Self { f: Box::new(f) }
    }
}

impl FrameScorer for FnScorer {
    fn input_size(&self) -> u32 {
        STUB_INPUT_SIZE
    }

    fn score(&self, image: &NormalizedImage) -> MediaResult<f32> {
        (self.f)(image)
    }
}

/// Scorer keyed on the ordinal encoded in a [`solid_frame`].
pub struct OrdinalScorer {
    inner: FnScorer,
}

impl OrdinalScorer {
    pub fn new(f: impl Fn(u64) -> MediaResult<f32> + Send + Sync + 'static) -> Self {
        Self {
            inner: FnScorer::new(move |image| {
                let ordinal = (image.as_hwc()[0] * 255.0).round() as u64;
                f(ordinal)
            }),
        }
    }
}

impl FrameScorer for OrdinalScorer {
    fn input_size(&self) -> u32 {
        STUB_INPUT_SIZE
    }

    fn score(&self, image: &NormalizedImage) -> MediaResult<f32> {
        self.inner.score(image)
    }
}
