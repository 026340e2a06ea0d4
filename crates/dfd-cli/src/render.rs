//! Human-readable report output.

use std::fmt::Write;

use dfd_models::{AnalysisReport, ImageAnalysisReport, Metadata, VideoAnalysisReport};

/// Format a report for the terminal.
pub fn render_report(report: &AnalysisReport) -> String {
    match report {
        AnalysisReport::Image(r) => render_image(r),
        AnalysisReport::Video(r) => render_video(r),
    }
}

fn render_image(report: &ImageAnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File:       {}", report.file_name);
    let _ = writeln!(out, "Verdict:    {}", report.label);
    let _ = writeln!(out, "Confidence: {:.2}%", report.confidence as f64 * 100.0);
    render_metadata(&mut out, &report.metadata);
    out
}

fn render_video(report: &VideoAnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File:       {}", report.file_name);
    let _ = writeln!(out, "Verdict:    {}", report.final_label);
    let _ = writeln!(out, "Accuracy:   {:.2}%", report.detection_accuracy);
    let mut sampling = format!(
        "every {} frames, {} sampled",
        report.frame_interval, report.sampled_frame_count
    );
    if report.failed_frame_count > 0 {
        let _ = write!(sampling, ", {} failed", report.failed_frame_count);
    }
    let _ = writeln!(
        out,
        "Frames:     {} fake, {} real ({})",
        report.fake_frame_count, report.real_frame_count, sampling
    );
    if report.cancelled {
        let _ = writeln!(out, "Note:       analysis was cancelled; counts are partial");
    }
    render_metadata(&mut out, &report.metadata);
    out
}

fn render_metadata(out: &mut String, metadata: &Metadata) {
    let _ = writeln!(out, "Metadata:");
    if let Some(error) = &metadata.error {
        let _ = writeln!(out, "  unavailable: {}", error);
        return;
    }

    let _ = writeln!(out, "  Camera:   {}", metadata.camera.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Software: {}", metadata.software.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Captured: {}", metadata.capture_date.as_deref().unwrap_or("-"));

    if metadata.tamper_warning {
        let _ = writeln!(
            out,
            "[WARNING] Editing software tag present; the file may have been modified"
        );
    }
}
