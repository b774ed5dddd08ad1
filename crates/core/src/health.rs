use serde::{Deserialize, Serialize};

/// Outbound pipeline health over a time window.
///
/// `score = 100 − 70 × failure_rate − 30 × pending_rate`, clamped to 0..=100.
/// Observability only; nothing gates on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineHealth {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub pending: u64,
    pub failure_rate: f64,
    pub pending_rate: f64,
    pub score: u8,
}

impl PipelineHealth {
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "message counts are far below f64 precision limits; score is clamped to 0..=100"
    )]
    pub fn from_counts(sent: u64, failed: u64, pending: u64) -> Self {
        let total = sent.saturating_add(failed).saturating_add(pending);
        if total == 0 {
            return Self {
                total,
                sent,
                failed,
                pending,
                failure_rate: 0.0,
                pending_rate: 0.0,
                score: 100,
            };
        }
        let failure_rate = failed as f64 / total as f64;
        let pending_rate = pending as f64 / total as f64;
        let raw = 100.0 - 70.0 * failure_rate - 30.0 * pending_rate;
        let score = raw.round().clamp(0.0, 100.0) as u8;
        Self { total, sent, failed, pending, failure_rate, pending_rate, score }
    }

    /// Signed change in score from `before` to `self`.
    #[must_use]
    pub fn improvement_over(&self, before: &Self) -> i16 {
        i16::from(self.score) - i16::from(before.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_is_healthy() {
        let h = PipelineHealth::from_counts(0, 0, 0);
        assert_eq!(h.score, 100);
        assert_eq!(h.total, 0);
    }

    #[test]
    fn all_failed_scores_thirty() {
        assert_eq!(PipelineHealth::from_counts(0, 10, 0).score, 30);
    }

    #[test]
    fn all_pending_scores_seventy() {
        assert_eq!(PipelineHealth::from_counts(0, 0, 4).score, 70);
    }

    #[test]
    fn mixed_rates_are_weighted() {
        // 10% failed, 10% pending -> 100 - 7 - 3 = 90
        let h = PipelineHealth::from_counts(80, 10, 10);
        assert_eq!(h.score, 90);
        assert!((h.failure_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn improvement_is_signed() {
        let before = PipelineHealth::from_counts(5, 5, 0);
        let after = PipelineHealth::from_counts(10, 0, 0);
        assert_eq!(after.improvement_over(&before), 35);
        assert_eq!(before.improvement_over(&after), -35);
    }
}
