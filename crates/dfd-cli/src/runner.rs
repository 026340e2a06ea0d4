//! Runs one analysis off the async runtime.
//!
//! The pipeline is blocking, so it executes on the blocking pool while the
//! caller keeps ownership of the cancellation signal.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use dfd_media::{AggregateOptions, DeepfakeAnalyzer, FrameScorer};
use dfd_models::AnalysisReport;

use crate::logging::AnalysisLogger;

/// What to analyze.
#[derive(Debug, Clone)]
pub enum Request {
    Image(PathBuf),
    /// `interval` falls back to the analyzer's configured stride
    Video { path: PathBuf, interval: Option<u32> },
    /// Pick image or video from the extension
    Auto(PathBuf),
}

impl Request {
    pub fn path(&self) -> &Path {
        match self {
            Request::Image(path) | Request::Auto(path) => path,
            Request::Video { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::Image(_) => "image",
            Request::Video { .. } => "video",
            Request::Auto(_) => "auto",
        }
    }
}

/// Run `request` on the blocking pool.
///
/// Setting `cancel_rx` to `true` stops a video after its current frame; the
/// partial report is still returned.
pub async fn run<S>(
    analyzer: Arc<DeepfakeAnalyzer<S>>,
    request: Request,
    cancel_rx: watch::Receiver<bool>,
) -> Result<AnalysisReport>
where
    S: FrameScorer + 'static,
{
    let logger = AnalysisLogger::new(request.path().display().to_string(), request.kind());
    logger.log_start();

    let progress_logger = logger.clone();
    let options = AggregateOptions::new()
        .with_cancel(cancel_rx)
        .with_progress(Box::new(move |progress| progress_logger.log_progress(&progress)));

    let span = logger.create_span();
    let task_request = request.clone();
    let result = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        match task_request {
            Request::Image(path) => analyzer.analyze_image(&path).map(AnalysisReport::from),
            Request::Video { path, interval } => analyzer
                .analyze_video(&path, interval.unwrap_or(analyzer.frame_interval()), &options)
                .map(AnalysisReport::from),
            Request::Auto(path) => analyzer.analyze(&path, &options),
        }
    })
    .await
    .context("Analysis task panicked")?;

    match result {
        Ok(report) => {
            if let AnalysisReport::Video(video) = &report {
                if video.cancelled {
                    logger.log_warning("cancelled before the end of the video");
                }
            }
            logger.log_completion(&report);
            Ok(report)
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            Err(e).with_context(|| format!("Failed to analyze {}", request.path().display()))
        }
    }
}
