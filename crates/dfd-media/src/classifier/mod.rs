//! Frame classifier adapter.
//!
//! The model is an opaque scoring function behind [`FrameScorer`]. The
//! adapter owns the preprocessing (fixed square resize, RGB, `[0, 1]`
//! pixels, batch of one) and turns the raw score into a [`FrameScore`].

mod onnx;

pub use onnx::{OnnxScorer, OnnxScorerConfig, TensorLayout};

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::time::Instant;
use tracing::debug;

use dfd_models::{FrameScore, FrameVerdict};

use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::sampler::SampledFrame;

/// Default classifier input resolution (MesoNet-style 256x256).
pub const DEFAULT_INPUT_SIZE: u32 = 256;

/// A resized RGB image scaled to `[0, 1]`, laid out HWC for a batch of one.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    size: u32,
    data: Vec<f32>,
}

impl NormalizedImage {
    /// Resize and normalize an image to `size x size`.
    pub fn from_image(image: &DynamicImage, size: u32) -> Self {
        let resized = image.resize_exact(size, size, FilterType::Triangle);
        Self::from_rgb(&resized.to_rgb8())
    }

    /// Normalize an RGB image already at the target square size.
    fn from_rgb(rgb: &RgbImage) -> Self {
        let data = rgb.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            size: rgb.width(),
            data,
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tensor shape `[1, H, W, 3]`.
    pub fn shape(&self) -> [usize; 4] {
        let s = self.size as usize;
        [1, s, s, 3]
    }

    /// Pixels in HWC order.
    pub fn as_hwc(&self) -> &[f32] {
        &self.data
    }

    /// Pixels reordered to CHW.
    pub fn to_chw(&self) -> Vec<f32> {
        let plane = (self.size as usize) * (self.size as usize);
        let mut chw = vec![0.0f32; plane * 3];
        for (i, px) in self.data.chunks_exact(3).enumerate() {
            chw[i] = px[0];
            chw[plane + i] = px[1];
            chw[2 * plane + i] = px[2];
        }
        chw
    }
}

/// Opaque binary image scorer.
///
/// Returns the probability that the image is manipulated. Implementations
/// must not carry state between calls.
pub trait FrameScorer: Send + Sync {
    /// Square input resolution expected by the model.
    fn input_size(&self) -> u32;

    fn score(&self, image: &NormalizedImage) -> MediaResult<f32>;
}

impl<S: FrameScorer + ?Sized> FrameScorer for Box<S> {
    fn input_size(&self) -> u32 {
        (**self).input_size()
    }

    fn score(&self, image: &NormalizedImage) -> MediaResult<f32> {
        (**self).score(image)
    }
}

/// Normalizes images and validates scorer output.
pub struct FrameClassifier<S> {
    scorer: S,
}

impl<S: FrameScorer> FrameClassifier<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Score one decoded image.
    ///
    /// Fails with `Inference` if the scorer errors or returns anything
    /// outside `[0, 1]`.
    pub fn classify(&self, image: &DynamicImage) -> MediaResult<FrameScore> {
        let normalized = NormalizedImage::from_image(image, self.scorer.input_size());
        self.classify_normalized(&normalized)
    }

    /// Score one sampled video frame, keeping its ordinal.
    pub fn classify_frame(&self, frame: &SampledFrame) -> MediaResult<FrameVerdict> {
        let size = self.scorer.input_size();
        let normalized = if frame.image.width() == size && frame.image.height() == size {
            NormalizedImage::from_rgb(&frame.image)
        } else {
            let resized =
                image::imageops::resize(&frame.image, size, size, FilterType::Triangle);
            NormalizedImage::from_rgb(&resized)
        };

        let score = self.classify_normalized(&normalized)?;
        Ok(score.into_verdict(frame.ordinal))
    }

    fn classify_normalized(&self, image: &NormalizedImage) -> MediaResult<FrameScore> {
        let start = Instant::now();
        let raw = self.scorer.score(image).map_err(|e| match e {
            MediaError::Inference(_) => e,
            other => MediaError::inference(other.to_string()),
        })?;
        metrics::record_inference_duration(start.elapsed().as_secs_f64());

        let score = FrameScore::new(raw).ok_or_else(|| {
            MediaError::inference(format!("Scorer returned {} outside [0, 1]", raw))
        })?;

        debug!(
            raw_score = score.raw_score(),
            label = %score.label(),
            confidence = score.confidence(),
            "Frame classified"
        );

        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{solid_frame, ConstantScorer, FnScorer};
    use dfd_models::Label;

    #[test]
    fn test_normalized_image_shape_and_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, image::Rgb([255, 0, 51])));
        let normalized = NormalizedImage::from_image(&img, 8);

        assert_eq!(normalized.size(), 8);
        assert_eq!(normalized.shape(), [1, 8, 8, 3]);
        assert_eq!(normalized.as_hwc().len(), 8 * 8 * 3);
        assert!(normalized.as_hwc().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((normalized.as_hwc()[0] - 1.0).abs() < 1e-6);
        assert!((normalized.as_hwc()[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_to_chw_planes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0])));
        let chw = NormalizedImage::from_image(&img, 2).to_chw();

        assert_eq!(chw.len(), 12);
        assert!(chw[..4].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(chw[4..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_classify_fake() {
        let classifier = FrameClassifier::new(ConstantScorer::new(0.92));
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));

        let score = classifier.classify(&img).unwrap();
        assert_eq!(score.label(), Label::Fake);
        assert!((score.confidence() - 0.92).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_score_is_inference_error() {
        let classifier = FrameClassifier::new(ConstantScorer::new(1.7));
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        let err = classifier.classify(&img).unwrap_err();
        assert!(matches!(err, MediaError::Inference(_)));
    }

    #[test]
    fn test_nan_score_is_inference_error() {
        let classifier = FrameClassifier::new(ConstantScorer::new(f32::NAN));
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(classifier.classify(&img), Err(MediaError::Inference(_))));
    }

    #[test]
    fn test_scorer_failure_becomes_inference_error() {
        let classifier = FrameClassifier::new(FnScorer::new(|_| {
            Err(MediaError::invalid_config("session poisoned"))
        }));
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        let err = classifier.classify(&img).unwrap_err();
        assert!(matches!(err, MediaError::Inference(_)));
        assert!(err.to_string().contains("session poisoned"));
    }

    #[test]
    fn test_classify_frame_resizes_and_keeps_ordinal() {
        let classifier = FrameClassifier::new(FnScorer::new(|img| {
            assert_eq!(img.size(), crate::testing::STUB_INPUT_SIZE);
            Ok(0.2)
        }));

        let verdict = classifier.classify_frame(&solid_frame(30, 64, 48)).unwrap();
        assert_eq!(verdict.index, 30);
        assert_eq!(verdict.label, Label::Real);
        assert!((verdict.confidence - 0.8).abs() < 1e-6);
    }
}
