//! Capability adapters for relevance scoring and peak forecasting.
//!
//! [`ModelClient`] talks to a model-serving HTTP endpoint and implements the
//! forecast port; [`ModelRelevanceScorer`] adapts it to the scoring port.
//! [`LexiconScorer`] is the offline fallback used when no endpoint is
//! configured.

pub mod client;
pub mod error;
pub mod lexicon;
mod retry;
pub mod types;

pub use client::{ModelClient, ModelRelevanceScorer};
pub use error::ModelError;
pub use lexicon::LexiconScorer;
pub use types::{ForecastResponse, RelevanceRequest, RelevanceResponse};
