//! Request/response payloads for the model-serving endpoints.

use serde::{Deserialize, Serialize};

use trendlab_core::model::RawSignal;
use trendlab_core::BusinessContext;

/// Body of `POST /v1/relevance`: the signal under judgment plus the business
/// context the score is relative to.
#[derive(Debug, Clone, Serialize)]
pub struct RelevanceRequest {
    pub business: String,
    pub pillars: Vec<String>,
    pub keyword: String,
    pub related_keywords: Vec<String>,
}

impl RelevanceRequest {
    #[must_use]
    pub fn for_signal(context: &BusinessContext, signal: &RawSignal) -> Self {
        Self {
            business: context.description.clone(),
            pillars: context.pillars.iter().map(|p| p.name.clone()).collect(),
            keyword: signal.keyword.clone(),
            related_keywords: signal.related_keywords.clone(),
        }
    }
}

/// Body of a `POST /v1/relevance` response.
///
/// `score` is declared as `i64` so an out-of-contract value still parses and
/// can be rejected with a precise error instead of a type mismatch.
#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceResponse {
    pub score: i64,
}

/// Body of a `POST /v1/forecast` response. Same widening rationale as
/// [`RelevanceResponse`]: parse first, range-check second.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub days_until_peak: i64,
    pub confidence: i64,
    pub reasoning: String,
}
