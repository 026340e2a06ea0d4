//! Image and video analysis entry points.

use std::num::NonZeroU32;
use std::path::Path;
use tracing::{info, info_span, warn};

use dfd_models::{AnalysisId, AnalysisReport, ImageAnalysisReport, MediaKind, Metadata, VideoAnalysisReport};

use crate::aggregator::{aggregate_decoder, AggregateOptions};
use crate::classifier::{FrameClassifier, FrameScorer, OnnxScorer};
use crate::config::AnalyzerConfig;
use crate::decoder::{FfmpegDecoder, VideoDecoder};
use crate::error::{MediaError, MediaResult};
use crate::metadata;
use crate::metrics;
use crate::report::{assemble_image, assemble_video};
use crate::sampler::{frame_interval, DEFAULT_FRAME_INTERVAL};

/// One pipeline instance: a classifier plus the default sampling stride.
///
/// Analyses run synchronously on the calling thread. For parallel work,
/// build one analyzer per worker.
pub struct DeepfakeAnalyzer<S> {
    classifier: FrameClassifier<S>,
    frame_interval: u32,
}

impl DeepfakeAnalyzer<OnnxScorer> {
    /// Load the ONNX classifier described by `config`.
    pub fn from_config(config: &AnalyzerConfig) -> MediaResult<Self> {
        config.validate()?;
        let scorer = OnnxScorer::new(config.scorer_config())?;
        Ok(Self::new(scorer).with_frame_interval(config.frame_interval))
    }
}

impl<S: FrameScorer> DeepfakeAnalyzer<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            classifier: FrameClassifier::new(scorer),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    /// Set the stride used by [`analyze`](Self::analyze).
    pub fn with_frame_interval(mut self, frame_interval: u32) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub fn frame_interval(&self) -> u32 {
        self.frame_interval
    }

    pub fn classifier(&self) -> &FrameClassifier<S> {
        &self.classifier
    }

    /// Dispatch on the file extension.
    pub fn analyze(
        &self,
        path: impl AsRef<Path>,
        options: &AggregateOptions,
    ) -> MediaResult<AnalysisReport> {
        let path = path.as_ref();
        match MediaKind::from_path(path) {
            Some(MediaKind::Image) => self.analyze_image(path).map(AnalysisReport::from),
            Some(MediaKind::Video) => self
                .analyze_video(path, self.frame_interval, options)
                .map(AnalysisReport::from),
            None => {
                ensure_exists(path)?;
                Err(MediaError::UnsupportedFormat(path.display().to_string()))
            }
        }
    }

    /// Classify a single still image.
    ///
    /// Fails with `NotFound`, `Decode` (not a readable image) or `Inference`.
    pub fn analyze_image(&self, path: impl AsRef<Path>) -> MediaResult<ImageAnalysisReport> {
        let path = path.as_ref();
        let analysis_id = AnalysisId::new();
        let _span = info_span!("analysis", analysis_id = %analysis_id, kind = "image").entered();

        let result = self.run_image(analysis_id, path);
        record_outcome(MediaKind::Image, &result);
        result
    }

    fn run_image(&self, analysis_id: AnalysisId, path: &Path) -> MediaResult<ImageAnalysisReport> {
        ensure_exists(path)?;
        info!(path = %path.display(), "Analyzing image");

        let image = image::open(path)
            .map_err(|e| MediaError::decode(format!("{}: {}", path.display(), e)))?;

        let metadata = metadata::extract(path);
        let score = self.classifier.classify(&image)?;

        let report = assemble_image(analysis_id, path, score, metadata);
        info!(
            label = %report.label,
            confidence = report.confidence,
            tamper_warning = report.metadata.tamper_warning,
            "Image analysis complete"
        );
        Ok(report)
    }

    /// Sample and classify a video.
    ///
    /// Fails with `NotFound` or `Decode` only when the container cannot be
    /// opened at all; per-frame inference failures are absorbed.
    pub fn analyze_video(
        &self,
        path: impl AsRef<Path>,
        frame_interval: u32,
        options: &AggregateOptions,
    ) -> MediaResult<VideoAnalysisReport> {
        let path = path.as_ref();
        let analysis_id = AnalysisId::new();
        let _span = info_span!("analysis", analysis_id = %analysis_id, kind = "video").entered();

        let result = self.open_and_run_video(analysis_id, path, frame_interval, options);
        record_outcome(MediaKind::Video, &result);
        result
    }

    fn open_and_run_video(
        &self,
        analysis_id: AnalysisId,
        path: &Path,
        interval: u32,
        options: &AggregateOptions,
    ) -> MediaResult<VideoAnalysisReport> {
        let interval = frame_interval(interval)?;
        let decoder = FfmpegDecoder::open(path)?;
        let metadata = metadata::metadata_from_container_tags(&decoder.info().tags);
        Ok(self.run_video(analysis_id, path, decoder, interval, metadata, options))
    }

    /// Analyze a video through a caller-supplied decoder.
    ///
    /// Metadata is still read from `path`.
    pub fn analyze_video_with_decoder<D: VideoDecoder>(
        &self,
        path: impl AsRef<Path>,
        decoder: D,
        frame_interval: u32,
        options: &AggregateOptions,
    ) -> MediaResult<VideoAnalysisReport> {
        let path = path.as_ref();
        let analysis_id = AnalysisId::new();
        let _span = info_span!("analysis", analysis_id = %analysis_id, kind = "video").entered();

        let result = self::frame_interval(frame_interval).map(|interval| {
            let metadata = metadata::extract_container(path);
            self.run_video(analysis_id, path, decoder, interval, metadata, options)
        });

        record_outcome(MediaKind::Video, &result);
        result
    }

    fn run_video<D: VideoDecoder>(
        &self,
        analysis_id: AnalysisId,
        path: &Path,
        decoder: D,
        interval: NonZeroU32,
        metadata: Metadata,
        options: &AggregateOptions,
    ) -> VideoAnalysisReport {
        let (width, height) = decoder.dimensions();
        info!(
            path = %path.display(),
            total_frames = decoder.total_frames(),
            width,
            height,
            interval = interval.get(),
            "Analyzing video"
        );

        let verdict = aggregate_decoder(decoder, interval, &self.classifier, options);
        if verdict.analyzed_frame_count() == 0 {
            warn!(
                sampled = verdict.sampled_frame_count,
                "No frames were analyzed; reporting zero accuracy"
            );
        }

        assemble_video(analysis_id, path, interval.get(), verdict, metadata)
    }
}

fn ensure_exists(path: &Path) -> MediaResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::NotFound(path.to_path_buf()))
    }
}

fn record_outcome<T>(kind: MediaKind, result: &MediaResult<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(MediaError::NotFound(_)) => "not_found",
        Err(MediaError::Decode(_)) => "decode_error",
        Err(MediaError::Inference(_)) => "inference_error",
        Err(_) => "error",
    };
    metrics::record_analysis(kind.as_str(), outcome);
}
