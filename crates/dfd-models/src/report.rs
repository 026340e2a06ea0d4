//! Terminal analysis reports handed back to the caller.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Label, Metadata};

/// Unique identifier for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnalysisId(pub String);

impl AnalysisId {
    /// Generate a new random analysis ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of classifying a single still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageAnalysisReport {
    pub analysis_id: AnalysisId,
    pub file_name: String,
    pub label: Label,
    /// Classifier confidence in `[0.5, 1.0]`
    pub confidence: f32,
    pub metadata: Metadata,
    pub analyzed_at: DateTime<Utc>,
}

/// Result of the frame-sampling analysis of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysisReport {
    pub analysis_id: AnalysisId,
    pub file_name: String,
    /// Stride between sampled frames
    pub frame_interval: u32,
    pub fake_frame_count: u64,
    pub real_frame_count: u64,
    pub final_label: Label,
    /// Majority share in percent; 0 when no frame was analyzed
    pub detection_accuracy: f64,
    pub sampled_frame_count: u64,
    pub failed_frame_count: u64,
    pub cancelled: bool,
    pub metadata: Metadata,
    pub analyzed_at: DateTime<Utc>,
}

/// Either report, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisReport {
    Image(ImageAnalysisReport),
    Video(VideoAnalysisReport),
}

impl AnalysisReport {
    pub fn analysis_id(&self) -> &AnalysisId {
        match self {
            AnalysisReport::Image(r) => &r.analysis_id,
            AnalysisReport::Video(r) => &r.analysis_id,
        }
    }

    /// Overall verdict regardless of kind.
    pub fn label(&self) -> Label {
        match self {
            AnalysisReport::Image(r) => r.label,
            AnalysisReport::Video(r) => r.final_label,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            AnalysisReport::Image(r) => &r.metadata,
            AnalysisReport::Video(r) => &r.metadata,
        }
    }
}

impl From<ImageAnalysisReport> for AnalysisReport {
    fn from(report: ImageAnalysisReport) -> Self {
        AnalysisReport::Image(report)
    }
}

impl From<VideoAnalysisReport> for AnalysisReport {
    fn from(report: VideoAnalysisReport) -> Self {
        AnalysisReport::Video(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_report() -> ImageAnalysisReport {
        ImageAnalysisReport {
            analysis_id: AnalysisId::from_string("a-1"),
            file_name: "face.jpg".to_string(),
            label: Label::Fake,
            confidence: 0.92,
            metadata: Metadata::default(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_analysis_id_unique() {
        assert_ne!(AnalysisId::new(), AnalysisId::new());
    }

    #[test]
    fn test_report_tagged_by_kind() {
        let report = AnalysisReport::from(image_report());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["kind"], "image");
        assert_eq!(json["label"], "Fake");
        assert_eq!(json["analysis_id"], "a-1");
    }

    #[test]
    fn test_report_accessors() {
        let report = AnalysisReport::from(image_report());
        assert_eq!(report.label(), Label::Fake);
        assert_eq!(report.analysis_id().as_str(), "a-1");
        assert!(!report.metadata().tamper_warning);
    }
}
