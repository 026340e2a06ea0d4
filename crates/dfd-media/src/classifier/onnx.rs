//! ONNX Runtime-backed frame scorer.
//!
//! Runs an exported binary deepfake classifier (for example a MesoNet
//! converted from Keras) whose single output is the probability that the
//! input is manipulated.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use super::{FrameScorer, NormalizedImage, DEFAULT_INPUT_SIZE};
use crate::error::{MediaError, MediaResult};

/// Input tensor layout expected by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, the Keras default
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, the PyTorch default
    Nchw,
}

impl FromStr for TensorLayout {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nhwc" => Ok(TensorLayout::Nhwc),
            "nchw" => Ok(TensorLayout::Nchw),
            other => Err(MediaError::invalid_config(format!(
                "unknown tensor layout '{}', expected nhwc or nchw",
                other
            ))),
        }
    }
}

/// Configuration for the ONNX scorer.
#[derive(Debug, Clone)]
pub struct OnnxScorerConfig {
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Square input size in pixels
    pub input_size: u32,
    pub layout: TensorLayout,
}

impl Default for OnnxScorerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/mesonet.onnx"),
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Binary classifier running in an ONNX Runtime session.
///
/// The session is serialized behind a mutex; use one scorer per pipeline
/// instance for parallel analyses.
pub struct OnnxScorer {
    session: Mutex<Session>,
    config: OnnxScorerConfig,
}

impl OnnxScorer {
    /// Load the model described by `config`.
    pub fn new(config: OnnxScorerConfig) -> MediaResult<Self> {
        if config.input_size == 0 {
            return Err(MediaError::invalid_config("input size must be positive"));
        }
        if !config.model_path.exists() {
            return Err(MediaError::model_not_found(
                config.model_path.display().to_string(),
            ));
        }

        let session = Mutex::new(create_session(&config.model_path)?);
        info!(
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            layout = ?config.layout,
            "Frame scorer initialized"
        );

        Ok(Self { session, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OnnxScorerConfig {
        &self.config
    }

    fn to_tensor(&self, image: &NormalizedImage) -> MediaResult<Value> {
        let s = image.size() as usize;
        let (shape, data) = match self.config.layout {
            TensorLayout::Nhwc => (vec![1usize, s, s, 3], image.as_hwc().to_vec()),
            TensorLayout::Nchw => (vec![1usize, 3, s, s], image.to_chw()),
        };

        Tensor::from_array((shape, data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::inference(format!("Failed to create tensor: {}", e)))
    }
}

impl FrameScorer for OnnxScorer {
    fn input_size(&self) -> u32 {
        self.config.input_size
    }

    fn score(&self, image: &NormalizedImage) -> MediaResult<f32> {
        if image.size() != self.config.input_size {
            return Err(MediaError::inference(format!(
                "Expected {}x{} input, got {}x{}",
                self.config.input_size,
                self.config.input_size,
                image.size(),
                image.size()
            )));
        }

        let input = self.to_tensor(image)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::inference("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::inference(format!("ONNX inference failed: {}", e)))?;

        if outputs.len() == 0 {
            return Err(MediaError::inference("Model returned no outputs"));
        }

        // Single sigmoid unit: shape [1, 1] or [1]
        let (_, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::inference(format!("Failed to extract tensor: {}", e)))?;

        let raw = values
            .first()
            .copied()
            .ok_or_else(|| MediaError::inference("Model output tensor is empty"))?;

        debug!(raw, "ONNX scorer output");
        Ok(raw)
    }
}

/// Create ONNX Runtime session with automatic execution provider selection.
fn create_session(model_path: &Path) -> MediaResult<Session> {
    // Read model file
    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| MediaError::inference(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::inference(format!("Failed to set optimization level: {}", e)))?;

    // Try CUDA on Linux with cuda feature
    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for frame scoring");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, using CPU");
    }

    // CPU fallback
    info!("Using CPU execution provider for frame scoring");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| MediaError::inference(format!("Failed to load ONNX model: {}", e)))
}
