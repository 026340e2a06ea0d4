//! Analysis metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const ANALYSES_TOTAL: &str = "dfd_analyses_total";
    pub const FRAMES_SAMPLED_TOTAL: &str = "dfd_frames_sampled_total";
    pub const FRAMES_CLASSIFIED_TOTAL: &str = "dfd_frames_classified_total";
    pub const FRAMES_FAILED_TOTAL: &str = "dfd_frames_failed_total";
    pub const INFERENCE_DURATION_SECONDS: &str = "dfd_inference_duration_seconds";
    pub const METADATA_ERRORS_TOTAL: &str = "dfd_metadata_errors_total";
}

/// Record a finished or failed analysis.
pub fn record_analysis(kind: &str, outcome: &str) {
    let labels = [("kind", kind.to_string()), ("outcome", outcome.to_string())];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
}

/// Record a frame handed to the classifier.
pub fn record_frame_sampled() {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(1);
}

/// Record a classified frame by label.
pub fn record_frame_classified(label: &str) {
    let labels = [("label", label.to_string())];
    counter!(names::FRAMES_CLASSIFIED_TOTAL, &labels).increment(1);
}

/// Record a frame whose inference failed.
pub fn record_frame_failed() {
    counter!(names::FRAMES_FAILED_TOTAL).increment(1);
}

/// Record one scorer invocation.
pub fn record_inference_duration(duration_secs: f64) {
    histogram!(names::INFERENCE_DURATION_SECONDS).record(duration_secs);
}

/// Record a metadata extraction failure.
pub fn record_metadata_error() {
    counter!(names::METADATA_ERRORS_TOTAL).increment(1);
}
