//! Deepfake analysis pipeline.
//!
//! This crate provides:
//! - FFprobe/FFmpeg-backed video decoding and fixed-stride frame sampling
//! - ONNX Runtime frame classification
//! - Majority aggregation of per-frame verdicts
//! - EXIF and container metadata extraction with a tamper heuristic
//! - Report assembly for images and videos

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod command;
pub mod config;
pub mod decoder;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod report;
pub mod sampler;

#[cfg(test)]
mod testing;

pub use aggregator::{aggregate, aggregate_decoder, aggregate_video, AggregateOptions};
pub use analyzer::DeepfakeAnalyzer;
pub use classifier::{FrameClassifier, FrameScorer, NormalizedImage, OnnxScorer, OnnxScorerConfig, TensorLayout};
pub use config::AnalyzerConfig;
pub use decoder::{FfmpegDecoder, VideoDecoder};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use progress::{AnalysisProgress, ProgressCallback};
pub use sampler::{FrameSampler, SampledFrame, DEFAULT_FRAME_INTERVAL};
