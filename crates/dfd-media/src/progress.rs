//! Video analysis progress reporting.

use serde::{Deserialize, Serialize};

/// Progress after each sampled frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Ordinal of the frame just processed
    pub ordinal: u64,
    /// Frames handed to the classifier so far
    pub sampled: u64,
    /// Frames the sampler aims to yield
    pub target: u64,
    pub fake: u64,
    pub real: u64,
    pub failed: u64,
}

impl AnalysisProgress {
    /// Progress percentage against the sampling target.
    pub fn percentage(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        ((self.sampled as f64 / self.target as f64) * 100.0).min(100.0)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(AnalysisProgress) + Send + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = AnalysisProgress {
            sampled: 5,
            target: 10,
            ..Default::default()
        };
        assert!((progress.percentage() - 50.0).abs() < 0.01);

        let unknown = AnalysisProgress::default();
        assert_eq!(unknown.percentage(), 0.0);
    }

    #[test]
    fn test_progress_capped() {
        let progress = AnalysisProgress {
            sampled: 12,
            target: 10,
            ..Default::default()
        };
        assert!((progress.percentage() - 100.0).abs() < 0.01);
    }
}
