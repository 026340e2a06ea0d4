//! Shared data models for the deepfake detector.
//!
//! This crate provides Serde-serializable types for:
//! - Frame scores and frame/video verdicts
//! - Provenance metadata and the tamper heuristic
//! - Image and video analysis reports

pub mod kind;
pub mod metadata;
pub mod report;
pub mod verdict;

// Re-export common types
pub use kind::MediaKind;
pub use metadata::Metadata;
pub use report::{AnalysisId, AnalysisReport, ImageAnalysisReport, VideoAnalysisReport};
pub use verdict::{FrameScore, FrameVerdict, Label, VideoVerdict, DECISION_THRESHOLD};
