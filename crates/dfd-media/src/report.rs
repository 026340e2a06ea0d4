//! Result assembly.
//!
//! Merges classifier output with extracted metadata into the report handed
//! back across the boundary. Pure; any failure already happened upstream.

use chrono::Utc;
use std::path::Path;

use dfd_models::{
    AnalysisId, FrameScore, ImageAnalysisReport, Metadata, VideoAnalysisReport, VideoVerdict,
};

/// Display name for a path (final component, lossy).
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Combine a single-image score with its metadata.
pub fn assemble_image(
    analysis_id: AnalysisId,
    path: &Path,
    score: FrameScore,
    metadata: Metadata,
) -> ImageAnalysisReport {
    ImageAnalysisReport {
        analysis_id,
        file_name: file_name(path),
        label: score.label(),
        confidence: score.confidence(),
        metadata,
        analyzed_at: Utc::now(),
    }
}

/// Combine a video verdict with its metadata.
pub fn assemble_video(
    analysis_id: AnalysisId,
    path: &Path,
    frame_interval: u32,
    verdict: VideoVerdict,
    metadata: Metadata,
) -> VideoAnalysisReport {
    VideoAnalysisReport {
        analysis_id,
        file_name: file_name(path),
        frame_interval,
        fake_frame_count: verdict.fake_frame_count,
        real_frame_count: verdict.real_frame_count,
        final_label: verdict.final_label,
        detection_accuracy: verdict.detection_accuracy,
        sampled_frame_count: verdict.sampled_frame_count,
        failed_frame_count: verdict.failed_frame_count,
        cancelled: verdict.cancelled,
        metadata,
        analyzed_at: Utc::now(),
    }
}
