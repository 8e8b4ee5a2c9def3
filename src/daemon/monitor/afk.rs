use std::time::Duration;

use tokio::time::Instant;

/// Decides whether a stretch of inactivity counts as being away from keyboard. The same
/// comparison paces re-injection while the user stays away.
pub struct AfkEvaluator {
    threshold_ms: u64,
}

impl AfkEvaluator {
    pub fn from_timeout(timeout: Duration) -> Self {
        Self {
            threshold_ms: timeout.as_millis() as u64,
        }
    }

    pub fn is_afk(&self, idle_time: u64) -> bool {
        idle_time >= self.threshold_ms
    }
}

/// Live state of one monitoring session.
pub enum AfkState {
    Active,
    Afk {
        /// Last-input tick new samples are judged against. Advanced past self-generated motion
        /// so only input that persists through the grace window flips the state back.
        confirm_baseline: u64,
        /// When the last injection sequence was triggered.
        last_move: Instant,
    },
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::AfkEvaluator;

    #[test]
    fn threshold_is_inclusive() {
        let evaluator = AfkEvaluator::from_timeout(Duration::from_secs(5));
        assert!(!evaluator.is_afk(0));
        assert!(!evaluator.is_afk(4999));
        assert!(evaluator.is_afk(5000));
        assert!(evaluator.is_afk(5001));
    }
}
