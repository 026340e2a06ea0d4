//! Majority aggregation of per-frame verdicts.
//!
//! Drives a frame sequence through the classifier one frame at a time and
//! reduces the results into a single [`VideoVerdict`]. A frame whose
//! inference fails is logged and left out of both counters; it never aborts
//! the video. Cancellation is cooperative and checked once per frame.

use std::num::NonZeroU32;
use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use dfd_models::{FrameVerdict, Label, VideoVerdict};

use crate::classifier::{FrameClassifier, FrameScorer};
use crate::decoder::{FfmpegDecoder, VideoDecoder};
use crate::error::MediaResult;
use crate::metrics;
use crate::progress::{AnalysisProgress, ProgressCallback};
use crate::sampler::{frame_interval, FrameSampler, SampledFrame};

/// Optional controls for one aggregation run.
#[derive(Default)]
pub struct AggregateOptions {
    /// Set to `true` to stop after the current frame
    cancel: Option<watch::Receiver<bool>>,
    progress: Option<ProgressCallback>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel_rx);
        self
    }

    /// Set per-frame progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}

/// Running counts for one video. Dropped once the verdict is built.
#[derive(Debug, Default)]
struct VerdictTally {
    fake: u64,
    real: u64,
    sampled: u64,
    failed: u64,
}

impl VerdictTally {
    fn record(&mut self, verdict: &FrameVerdict) {
        self.sampled += 1;
        match verdict.label {
            Label::Fake => self.fake += 1,
            Label::Real => self.real += 1,
        }
    }

    fn record_failure(&mut self) {
        self.sampled += 1;
        self.failed += 1;
    }

    fn progress(&self, ordinal: u64, target: u64) -> AnalysisProgress {
        AnalysisProgress {
            ordinal,
            sampled: self.sampled,
            target,
            fake: self.fake,
            real: self.real,
            failed: self.failed,
        }
    }

    fn finish(self, cancelled: bool) -> VideoVerdict {
        VideoVerdict {
            sampled_frame_count: self.sampled,
            failed_frame_count: self.failed,
            cancelled,
            ..VideoVerdict::from_counts(self.fake, self.real)
        }
    }
}

/// Classify every frame of `frames` and reduce to a video verdict.
///
/// `classify` errors are absorbed per frame; there are no retries.
pub fn aggregate<I, F>(frames: I, mut classify: F, options: &AggregateOptions) -> VideoVerdict
where
    I: IntoIterator<Item = SampledFrame>,
    F: FnMut(&SampledFrame) -> MediaResult<FrameVerdict>,
{
    let mut frames = frames.into_iter();
    let target = frames.size_hint().1.unwrap_or(0) as u64;
    let mut tally = VerdictTally::default();
    let mut cancelled = false;

    loop {
        if options.is_cancelled() {
            info!(sampled = tally.sampled, "Aggregation cancelled");
            cancelled = true;
            break;
        }

        let Some(frame) = frames.next() else {
            break;
        };
        metrics::record_frame_sampled();

        match classify(&frame) {
            Ok(verdict) => {
                debug!(
                    ordinal = verdict.index,
                    label = %verdict.label,
                    confidence = verdict.confidence,
                    "Frame verdict"
                );
                metrics::record_frame_classified(verdict.label.as_str());
                tally.record(&verdict);
            }
            Err(e) => {
                warn!(ordinal = frame.ordinal, "Skipping frame: {}", e);
                metrics::record_frame_failed();
                tally.record_failure();
            }
        }

        if let Some(progress) = &options.progress {
            progress(tally.progress(frame.ordinal, target));
        }
        // Frame buffer released here, before the next one is decoded
    }

    let verdict = tally.finish(cancelled);
    info!(
        fake = verdict.fake_frame_count,
        real = verdict.real_frame_count,
        failed = verdict.failed_frame_count,
        final_label = %verdict.final_label,
        detection_accuracy = verdict.detection_accuracy,
        "Video aggregation complete"
    );
    verdict
}

/// Sample `decoder` every `interval` frames and aggregate.
pub fn aggregate_decoder<D, S>(
    decoder: D,
    interval: NonZeroU32,
    classifier: &FrameClassifier<S>,
    options: &AggregateOptions,
) -> VideoVerdict
where
    D: VideoDecoder,
    S: FrameScorer,
{
    let total_frames = decoder.total_frames();
    let sampler = FrameSampler::new(decoder, interval);
    if sampler.target() == 0 {
        warn!(
            total_frames,
            interval = interval.get(),
            "Video shorter than the sampling interval; nothing to classify"
        );
    }
    aggregate(sampler, |frame| classifier.classify_frame(frame), options)
}

/// Open `video_path` and aggregate every `interval`-th frame.
///
/// Fails only when the container cannot be opened; per-frame failures are
/// absorbed.
pub fn aggregate_video<S: FrameScorer>(
    video_path: impl AsRef<Path>,
    interval: u32,
    classifier: &FrameClassifier<S>,
    options: &AggregateOptions,
) -> MediaResult<VideoVerdict> {
    let interval = frame_interval(interval)?;
    let decoder = FfmpegDecoder::open(video_path)?;
    Ok(aggregate_decoder(decoder, interval, classifier, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::testing::{solid_frame, OrdinalScorer, SyntheticDecoder};
    use dfd_models::FrameScore;
    use std::sync::{Arc, Mutex};

    fn verdict_for(frame: &SampledFrame, raw: f32) -> MediaResult<FrameVerdict> {
        Ok(FrameScore::new(raw).unwrap().into_verdict(frame.ordinal))
    }

    fn frames(n: u64) -> Vec<SampledFrame> {
        (0..n).map(|i| solid_frame(i * 10, 4, 4)).collect()
    }

    #[test]
    fn test_six_fake_four_real() {
        let verdict = aggregate(
            frames(10),
            |f| verdict_for(f, if f.ordinal < 60 { 0.9 } else { 0.2 }),
            &AggregateOptions::new(),
        );

        assert_eq!(verdict.fake_frame_count, 6);
        assert_eq!(verdict.real_frame_count, 4);
        assert_eq!(verdict.final_label, Label::Fake);
        assert_eq!(format!("{:.2}", verdict.detection_accuracy), "60.00");
        assert_eq!(verdict.sampled_frame_count, 10);
        assert!(!verdict.cancelled);
    }

    #[test]
    fn test_failed_frames_excluded() {
        // Frames 0, 30, 60 fail; the remaining 7 split 5 fake / 2 real
        let verdict = aggregate(
            frames(10),
            |f| match f.ordinal {
                0 | 30 | 60 => Err(MediaError::inference("model crashed")),
                10 | 20 => verdict_for(f, 0.1),
                _ => verdict_for(f, 0.8),
            },
            &AggregateOptions::new(),
        );

        assert_eq!(verdict.analyzed_frame_count(), 7);
        assert_eq!(verdict.fake_frame_count, 5);
        assert_eq!(verdict.real_frame_count, 2);
        assert_eq!(verdict.failed_frame_count, 3);
        assert_eq!(verdict.sampled_frame_count, 10);
        assert!((verdict.detection_accuracy - 500.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_frames_failed() {
        let verdict = aggregate(
            frames(4),
            |_| Err(MediaError::inference("nope")),
            &AggregateOptions::new(),
        );
        assert_eq!(verdict.analyzed_frame_count(), 0);
        assert_eq!(verdict.detection_accuracy, 0.0);
        assert_eq!(verdict.final_label, Label::Real);
        assert_eq!(verdict.failed_frame_count, 4);
    }

    #[test]
    fn test_tie_is_real() {
        let verdict = aggregate(
            frames(4),
            |f| verdict_for(f, if f.ordinal % 20 == 0 { 0.9 } else { 0.1 }),
            &AggregateOptions::new(),
        );
        assert_eq!(verdict.fake_frame_count, 2);
        assert_eq!(verdict.real_frame_count, 2);
        assert_eq!(verdict.final_label, Label::Real);
    }

    #[test]
    fn test_cancel_after_current_frame() {
        let (tx, rx) = watch::channel(false);
        let options = AggregateOptions::new().with_cancel(rx);

        let verdict = aggregate(
            frames(10),
            |f| {
                if f.ordinal == 20 {
                    tx.send(true).unwrap();
                }
                verdict_for(f, 0.9)
            },
            &options,
        );

        // Frames 0, 10 and 20 complete; the flag is seen before frame 30
        assert!(verdict.cancelled);
        assert_eq!(verdict.fake_frame_count, 3);
        assert_eq!(verdict.final_label, Label::Fake);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (_tx, rx) = watch::channel(true);
        let options = AggregateOptions::new().with_cancel(rx);

        let verdict = aggregate(frames(10), |f| verdict_for(f, 0.9), &options);
        assert!(verdict.cancelled);
        assert_eq!(verdict.sampled_frame_count, 0);
        assert_eq!(verdict.detection_accuracy, 0.0);
    }

    #[test]
    fn test_progress_reported_per_frame() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = AggregateOptions::new().with_progress(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));

        let decoder = SyntheticDecoder::new(50);
        let classifier = FrameClassifier::new(OrdinalScorer::new(|_| Ok(0.7)));
        aggregate_decoder(decoder, frame_interval(10).unwrap(), &classifier, &options);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0].target, 5);
        assert_eq!(seen[4].ordinal, 40);
        assert_eq!(seen[4].sampled, 5);
        assert_eq!(seen[4].fake, 5);
    }

    #[test]
    fn test_decoder_end_to_end_counts() {
        // 100 frames, interval 10: ordinals 0..=90; 60..=90 score real
        let decoder = SyntheticDecoder::new(100);
        let classifier = FrameClassifier::new(OrdinalScorer::new(|ordinal| {
            Ok(if ordinal < 60 { 0.95 } else { 0.05 })
        }));

        let verdict = aggregate_decoder(
            decoder,
            frame_interval(10).unwrap(),
            &classifier,
            &AggregateOptions::new(),
        );

        assert_eq!(verdict.fake_frame_count, 6);
        assert_eq!(verdict.real_frame_count, 4);
        assert_eq!(verdict.final_label, Label::Fake);
        assert!((verdict.detection_accuracy - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_never_exceed_sampled() {
        for fail_every in 1..5u64 {
            let verdict = aggregate(
                frames(20),
                |f| {
                    if (f.ordinal / 10) % fail_every == 0 {
                        Err(MediaError::inference("flaky"))
                    } else {
                        verdict_for(f, 0.6)
                    }
                },
                &AggregateOptions::new(),
            );
            assert!(verdict.analyzed_frame_count() <= verdict.sampled_frame_count);
            assert_eq!(
                verdict.analyzed_frame_count() + verdict.failed_frame_count,
                verdict.sampled_frame_count
            );
        }
    }

    #[test]
    fn test_aggregate_video_missing_file() {
        let classifier = FrameClassifier::new(OrdinalScorer::new(|_| Ok(0.5)));
        let err = aggregate_video("/no/such/clip.mp4", 10, &classifier, &AggregateOptions::new())
            .unwrap_err();
        assert!(matches!(err, MediaError::NotFound(_)));
    }

    #[test]
    fn test_aggregate_video_zero_interval() {
        let classifier = FrameClassifier::new(OrdinalScorer::new(|_| Ok(0.5)));
        let err = aggregate_video("/no/such/clip.mp4", 0, &classifier, &AggregateOptions::new())
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidConfig(_)));
    }
}
