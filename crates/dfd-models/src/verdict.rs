//! Frame-level and video-level verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw scores strictly above this value are classified as fake.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Binary classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Label {
    Fake,
    /// Also the tie-break outcome for videos.
    #[default]
    Real,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fake => "Fake",
            Label::Real => "Real",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier output for a single frame.
///
/// The score is the model's probability that the frame is manipulated.
/// Construction rejects anything outside `[0, 1]`, so label and confidence
/// are always well defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct FrameScore {
    raw_score: f32,
}

impl FrameScore {
    /// Wrap a raw score. Returns `None` for NaN, infinities and values outside `[0, 1]`.
    pub fn new(raw_score: f32) -> Option<Self> {
        if raw_score.is_finite() && (0.0..=1.0).contains(&raw_score) {
            Some(Self { raw_score })
        } else {
            None
        }
    }

    pub fn raw_score(&self) -> f32 {
        self.raw_score
    }

    /// `Fake` iff the raw score is strictly above 0.5.
    pub fn label(&self) -> Label {
        if self.raw_score > DECISION_THRESHOLD {
            Label::Fake
        } else {
            Label::Real
        }
    }

    /// Distance from the decision boundary, rescaled to `[0.5, 1.0]`.
    pub fn confidence(&self) -> f32 {
        if self.raw_score > DECISION_THRESHOLD {
            self.raw_score
        } else {
            1.0 - self.raw_score
        }
    }

    /// Attach the frame ordinal this score was produced for.
    pub fn into_verdict(self, index: u64) -> FrameVerdict {
        FrameVerdict {
            index,
            label: self.label(),
            confidence: self.confidence(),
        }
    }
}

/// Verdict for one sampled video frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameVerdict {
    /// Ordinal among all decoded frames (not among sampled ones)
    pub index: u64,
    pub label: Label,
    pub confidence: f32,
}

/// Majority verdict over the analyzed frames of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoVerdict {
    pub fake_frame_count: u64,
    pub real_frame_count: u64,
    pub final_label: Label,
    /// Majority share in percent; 0 when nothing was analyzed
    pub detection_accuracy: f64,
    /// Frames handed to the classifier, including failed ones
    pub sampled_frame_count: u64,
    /// Frames whose inference failed and were left out of both counts
    pub failed_frame_count: u64,
    /// Aggregation stopped early on request
    pub cancelled: bool,
}

impl VideoVerdict {
    /// Build a verdict from final counts.
    ///
    /// Ties resolve to [`Label::Real`].
    pub fn from_counts(fake_frame_count: u64, real_frame_count: u64) -> Self {
        let analyzed = fake_frame_count + real_frame_count;
        let detection_accuracy = if analyzed == 0 {
            0.0
        } else {
            100.0 * fake_frame_count.max(real_frame_count) as f64 / analyzed as f64
        };
        let final_label = if fake_frame_count > real_frame_count {
            Label::Fake
        } else {
            Label::Real
        };

        Self {
            fake_frame_count,
            real_frame_count,
            final_label,
            detection_accuracy,
            sampled_frame_count: analyzed,
            failed_frame_count: 0,
            cancelled: false,
        }
    }

    /// Frames that contributed to the majority vote.
    pub fn analyzed_frame_count(&self) -> u64 {
        self.fake_frame_count + self.real_frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_boundary_is_real() {
        let score = FrameScore::new(0.5).unwrap();
        assert_eq!(score.label(), Label::Real);
        assert!((score.confidence() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_score_above_threshold_is_fake() {
        let score = FrameScore::new(0.92).unwrap();
        assert_eq!(score.label(), Label::Fake);
        assert!((score.confidence() - 0.92).abs() < 1e-6);
    }

    #[test]
    fn test_low_score_confidence_is_mirrored() {
        let score = FrameScore::new(0.1).unwrap();
        assert_eq!(score.label(), Label::Real);
        assert!((score.confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_range() {
        for i in 0..=1000 {
            let score = FrameScore::new(i as f32 / 1000.0).unwrap();
            let confidence = score.confidence();
            assert!((0.5..=1.0).contains(&confidence), "score {} -> {}", i, confidence);
            assert_eq!(score.label() == Label::Fake, score.raw_score() > 0.5);
        }
    }

    #[test]
    fn test_score_rejects_invalid() {
        assert!(FrameScore::new(f32::NAN).is_none());
        assert!(FrameScore::new(f32::INFINITY).is_none());
        assert!(FrameScore::new(-0.01).is_none());
        assert!(FrameScore::new(1.01).is_none());
        assert!(FrameScore::new(0.0).is_some());
        assert!(FrameScore::new(1.0).is_some());
    }

    #[test]
    fn test_into_verdict_keeps_index() {
        let verdict = FrameScore::new(0.7).unwrap().into_verdict(40);
        assert_eq!(verdict.index, 40);
        assert_eq!(verdict.label, Label::Fake);
    }

    #[test]
    fn test_majority_fake() {
        let verdict = VideoVerdict::from_counts(6, 4);
        assert_eq!(verdict.final_label, Label::Fake);
        assert!((verdict.detection_accuracy - 60.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", verdict.detection_accuracy), "60.00");
    }

    #[test]
    fn test_tie_resolves_to_real() {
        let verdict = VideoVerdict::from_counts(5, 5);
        assert_eq!(verdict.final_label, Label::Real);
        assert!((verdict.detection_accuracy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_frames_analyzed() {
        let verdict = VideoVerdict::from_counts(0, 0);
        assert_eq!(verdict.final_label, Label::Real);
        assert_eq!(verdict.detection_accuracy, 0.0);
        assert_eq!(verdict.analyzed_frame_count(), 0);
    }

    #[test]
    fn test_accuracy_bounds() {
        for fake in 0..20u64 {
            for real in 0..20u64 {
                let verdict = VideoVerdict::from_counts(fake, real);
                if fake + real == 0 {
                    assert_eq!(verdict.detection_accuracy, 0.0);
                } else {
                    assert!((50.0..=100.0).contains(&verdict.detection_accuracy));
                }
            }
        }
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_string(&Label::Fake).unwrap(), "\"Fake\"");
        assert_eq!(Label::Real.to_string(), "Real");
    }
}
