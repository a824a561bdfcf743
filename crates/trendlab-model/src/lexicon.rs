//! Offline keyword-overlap relevance scorer.
//!
//! Used when no model endpoint is configured: scores a signal against the
//! business context's pillar keywords with fixed additive weights. Fully
//! deterministic and infallible, which also makes it the natural scorer for
//! engine tests.

use async_trait::async_trait;

use trendlab_core::model::{normalize_keyword, RawSignal};
use trendlab_core::ports::{RelevanceScorer, ScoreError};
use trendlab_core::BusinessContext;

/// Every signal starts here; pillar overlap adds on top.
const BASE_SCORE: u8 = 30;
/// First pillar whose keyword appears inside the trend keyword itself.
const DIRECT_PILLAR_SCORE: u8 = 40;
/// Each additional directly-matching pillar.
const EXTRA_DIRECT_SCORE: u8 = 10;
/// Each pillar matched only through a related keyword.
const RELATED_PILLAR_SCORE: u8 = 10;
/// At most this many related-only pillars count toward the score.
const MAX_RELATED_PILLARS: u8 = 2;

/// Deterministic relevance scorer over the configured business context.
pub struct LexiconScorer {
    context: BusinessContext,
}

impl LexiconScorer {
    #[must_use]
    pub fn new(context: BusinessContext) -> Self {
        Self { context }
    }

    /// Score a signal 0–100 by pillar-keyword overlap.
    ///
    /// A pillar matches *directly* when one of its keywords is contained in
    /// the normalized trend keyword, and *via related* when one of its
    /// keywords equals a normalized related keyword. Direct matches weigh
    /// more; the total saturates at 100.
    #[must_use]
    pub fn score_signal(&self, signal: &RawSignal) -> u8 {
        let keyword_norm = normalize_keyword(&signal.keyword);
        let related_norm: Vec<String> = signal
            .related_keywords
            .iter()
            .map(|r| normalize_keyword(r))
            .collect();

        let mut direct = 0u8;
        let mut related_only = 0u8;
        for pillar in &self.context.pillars {
            let mut direct_hit = false;
            let mut related_hit = false;
            for pillar_keyword in &pillar.keywords {
                let pk_norm = normalize_keyword(pillar_keyword);
                if pk_norm.is_empty() {
                    continue;
                }
                if keyword_norm.contains(&pk_norm) {
                    direct_hit = true;
                    break;
                }
                if related_norm.iter().any(|r| r == &pk_norm) {
                    related_hit = true;
                }
            }
            if direct_hit {
                direct += 1;
            } else if related_hit {
                related_only += 1;
            }
        }

        let mut score = BASE_SCORE;
        if direct > 0 {
            score = score.saturating_add(DIRECT_PILLAR_SCORE);
            score = score.saturating_add(EXTRA_DIRECT_SCORE.saturating_mul(direct - 1));
        }
        let related_counted = related_only.min(MAX_RELATED_PILLARS);
        score = score.saturating_add(RELATED_PILLAR_SCORE.saturating_mul(related_counted));

        score.min(100)
    }
}

#[async_trait]
impl RelevanceScorer for LexiconScorer {
    async fn score(&self, signal: &RawSignal) -> Result<u8, ScoreError> {
        Ok(self.score_signal(signal))
    }
}
