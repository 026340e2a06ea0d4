//! Structured analysis logging.
//!
//! Gives every CLI request the same `file`/`kind` fields so its log lines
//! can be grepped together, mirroring the library's per-analysis span.

use tracing::{error, info, warn, Span};

use dfd_media::AnalysisProgress;
use dfd_models::AnalysisReport;

/// Logger bound to one input file.
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    file: String,
    kind: String,
}

impl AnalysisLogger {
    /// Create a logger for `file`, analyzed as `kind` ("image", "video" or "auto").
    pub fn new(file: impl Into<String>, kind: &str) -> Self {
        Self {
            file: file.into(),
            kind: kind.to_string(),
        }
    }

    pub fn log_start(&self) {
        info!(file = %self.file, kind = %self.kind, "Analysis started");
    }

    pub fn log_progress(&self, progress: &AnalysisProgress) {
        info!(
            file = %self.file,
            kind = %self.kind,
            ordinal = progress.ordinal,
            sampled = progress.sampled,
            target = progress.target,
            fake = progress.fake,
            real = progress.real,
            failed = progress.failed,
            "Analysis progress: {:.0}%", progress.percentage()
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(file = %self.file, kind = %self.kind, "Analysis warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(file = %self.file, kind = %self.kind, "Analysis failed: {}", message);
    }

    pub fn log_completion(&self, report: &AnalysisReport) {
        info!(
            file = %self.file,
            kind = %self.kind,
            analysis_id = %report.analysis_id(),
            label = %report.label(),
            "Analysis completed"
        );
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Span wrapping one request.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("request", file = %self.file, kind = %self.kind)
    }
}
