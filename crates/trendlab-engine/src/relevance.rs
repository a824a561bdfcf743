//! Relevance gate: bounded scoring with a neutral fallback and the
//! persistence threshold that decides whether a signal is kept at all.

use std::sync::Arc;
use std::time::Duration;

use trendlab_core::model::RawSignal;
use trendlab_core::ports::RelevanceScorer;

/// Score assumed when the scorer fails, times out, or answers out of range.
pub const FALLBACK_SCORE: u8 = 50;

/// Minimum relevance for a record to be persisted at all. Signals scoring
/// below this are discarded before they reach the repository.
pub const PERSISTENCE_THRESHOLD: u8 = 40;

const MAX_SCORE: u8 = 100;

/// Wraps a [`RelevanceScorer`] port with a deadline and the neutral
/// fallback, so scorer trouble degrades to "average relevance" instead of
/// failing the collection pipeline.
pub struct RelevanceGate {
    scorer: Arc<dyn RelevanceScorer>,
    deadline: Duration,
}

impl RelevanceGate {
    #[must_use]
    pub fn new(scorer: Arc<dyn RelevanceScorer>, deadline: Duration) -> Self {
        Self { scorer, deadline }
    }

    /// Scores a signal, absorbing every scorer failure into [`FALLBACK_SCORE`].
    /// Recovered failures are logged, never surfaced.
    pub async fn score(&self, signal: &RawSignal) -> u8 {
        match tokio::time::timeout(self.deadline, self.scorer.score(signal)).await {
            Ok(Ok(score)) if score <= MAX_SCORE => score,
            Ok(Ok(score)) => {
                tracing::warn!(
                    keyword = %signal.keyword,
                    score,
                    "relevance score out of range; using neutral fallback"
                );
                FALLBACK_SCORE
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    keyword = %signal.keyword,
                    error = %err,
                    "relevance scorer failed; using neutral fallback"
                );
                FALLBACK_SCORE
            }
            Err(_) => {
                tracing::warn!(
                    keyword = %signal.keyword,
                    deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX),
                    "relevance scorer timed out; using neutral fallback"
                );
                FALLBACK_SCORE
            }
        }
    }
}

/// Whether a score clears the persistence threshold.
#[must_use]
pub fn meets_threshold(score: u8) -> bool {
    score >= PERSISTENCE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use trendlab_core::model::GeoScope;
    use trendlab_core::ports::ScoreError;

    struct FixedScorer(Result<u8, ScoreError>);

    #[async_trait]
    impl RelevanceScorer for FixedScorer {
        async fn score(&self, _signal: &RawSignal) -> Result<u8, ScoreError> {
            match &self.0 {
                Ok(score) => Ok(*score),
                Err(_) => Err(ScoreError::unavailable("scorer offline")),
            }
        }
    }

    struct SlowScorer;

    #[async_trait]
    impl RelevanceScorer for SlowScorer {
        async fn score(&self, _signal: &RawSignal) -> Result<u8, ScoreError> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(90)
        }
    }

    fn signal() -> RawSignal {
        RawSignal {
            source: "search".to_string(),
            keyword: "cold brew matcha".to_string(),
            volume: 12_000,
            growth_percent: 80.0,
            competition: None,
            sentiment: None,
            geography: GeoScope::global(),
            related_keywords: Vec::new(),
            top_content: Vec::new(),
            captured_at: None,
        }
    }

    #[tokio::test]
    async fn in_range_score_passes_through() {
        let gate = RelevanceGate::new(Arc::new(FixedScorer(Ok(87))), Duration::from_secs(1));
        assert_eq!(gate.score(&signal()).await, 87);
    }

    #[tokio::test]
    async fn scorer_error_falls_back_to_neutral() {
        let gate = RelevanceGate::new(
            Arc::new(FixedScorer(Err(ScoreError::unavailable("down")))),
            Duration::from_secs(1),
        );
        assert_eq!(gate.score(&signal()).await, FALLBACK_SCORE);
    }

    #[tokio::test]
    async fn out_of_range_score_falls_back_to_neutral() {
        let gate = RelevanceGate::new(Arc::new(FixedScorer(Ok(150))), Duration::from_secs(1));
        assert_eq!(gate.score(&signal()).await, FALLBACK_SCORE);
    }

    #[tokio::test]
    async fn slow_scorer_times_out_to_neutral() {
        let gate = RelevanceGate::new(Arc::new(SlowScorer), Duration::from_millis(25));
        assert_eq!(gate.score(&signal()).await, FALLBACK_SCORE);
    }

    #[test]
    fn threshold_keeps_forty_and_above() {
        assert!(!meets_threshold(35));
        assert!(!meets_threshold(39));
        assert!(meets_threshold(40));
        assert!(meets_threshold(100));
    }
}
