//! Analyzer configuration.

use std::path::PathBuf;

use crate::classifier::{OnnxScorerConfig, TensorLayout, DEFAULT_INPUT_SIZE};
use crate::error::{MediaError, MediaResult};
use crate::sampler::DEFAULT_FRAME_INTERVAL;

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// ONNX classifier model
    pub model_path: PathBuf,
    /// Square classifier input size in pixels
    pub input_size: u32,
    /// Classifier input tensor layout
    pub layout: TensorLayout,
    /// Default stride between sampled video frames
    pub frame_interval: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/mesonet.onnx"),
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl AnalyzerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        let defaults = Self::default();

        let config = Self {
            model_path: std::env::var("DFD_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            input_size: std::env::var("DFD_INPUT_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.input_size),
            layout: match std::env::var("DFD_TENSOR_LAYOUT") {
                Ok(s) => s.parse()?,
                Err(_) => defaults.layout,
            },
            frame_interval: std::env::var("DFD_FRAME_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.frame_interval),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> MediaResult<()> {
        if self.input_size == 0 {
            return Err(MediaError::invalid_config("DFD_INPUT_SIZE must be positive"));
        }
        if self.frame_interval == 0 {
            return Err(MediaError::invalid_config("DFD_FRAME_INTERVAL must be positive"));
        }
        Ok(())
    }

    /// Scorer settings derived from this config.
    pub fn scorer_config(&self) -> OnnxScorerConfig {
        OnnxScorerConfig {
            model_path: self.model_path.clone(),
            input_size: self.input_size,
            layout: self.layout,
        }
    }
}
