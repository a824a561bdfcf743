//! Collaborator ports the engine depends on.
//!
//! The engine fetches nothing from the network and owns no storage; it talks
//! to signal providers, the relevance scorer, the forecast model, and the
//! trend repository exclusively through these traits. Implementations live in
//! other crates (`trendlab-db`, `trendlab-model`) or in test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    AlgorithmExperiment, ExperimentOutcome, GeoScope, LifecycleStage, OpportunityWindow,
    PeakForecast, PeakPrediction, RawSignal, TrendRecord,
};

// ---------------------------------------------------------------------------
// Signal sources
// ---------------------------------------------------------------------------

/// Fetch parameters passed to every source in a collection pass.
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Seed keywords to expand from; empty means "whatever the source has".
    pub seed_keywords: Vec<String>,
    pub geography: GeoScope,
    /// Upper bound on signals a single source should return.
    pub limit: usize,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            seed_keywords: Vec::new(),
            geography: GeoScope::global(),
            limit: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("signal source unavailable: {0}")]
    Unavailable(String),
    #[error("signal source returned malformed data: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// One provider of raw trend signals (a search-trend API, a social firehose
/// export, a forum dump). Implementations handle their own transport.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Stable source name, recorded on every signal this source yields.
    fn name(&self) -> &str;

    async fn fetch_signals(&self, params: &FetchParams) -> Result<Vec<RawSignal>, SourceError>;
}

// ---------------------------------------------------------------------------
// Relevance scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("relevance scorer unavailable: {0}")]
    Unavailable(String),
    #[error("relevance scorer returned an invalid score: {0}")]
    Malformed(String),
}

impl ScoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Judges how relevant a signal is to the configured business, 0–100.
///
/// Implementations are constructed with whatever business context they need;
/// the engine only hands over the signal. Scores above 100 violate the
/// contract and are treated by callers as a scorer failure.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, signal: &RawSignal) -> Result<u8, ScoreError>;
}

// ---------------------------------------------------------------------------
// Peak forecasting
// ---------------------------------------------------------------------------

/// Everything a forecasting strategy sees about one trend: the record's
/// current shape plus the derived growth dynamics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastContext {
    pub keyword: String,
    pub lifecycle: LifecycleStage,
    pub volume: i64,
    pub growth_percent: f64,
    pub sentiment: f32,
    /// Growth change per day over the recent history window.
    pub velocity: f64,
    /// Velocity change per day over the recent history window.
    pub acceleration: f64,
}

impl ForecastContext {
    #[must_use]
    pub fn from_record(record: &TrendRecord, velocity: f64, acceleration: f64) -> Self {
        Self {
            keyword: record.keyword.clone(),
            lifecycle: record.lifecycle,
            volume: record.volume,
            growth_percent: record.growth_percent,
            sentiment: record.sentiment,
            velocity,
            acceleration,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast model unavailable: {0}")]
    Unavailable(String),
    #[error("forecast model returned a malformed response: {0}")]
    Malformed(String),
}

impl ForecastError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// External peak-timing model. Contract: `days_until_peak` in 1–30 and
/// `confidence` in 0–100; adapters must reject out-of-range responses as
/// [`ForecastError::Malformed`] rather than clamp them.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    async fn predict_peak(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError>;
}

// ---------------------------------------------------------------------------
// Trend repository
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trend record {0} not found")]
    RecordNotFound(Uuid),
    #[error("experiment {0} not found")]
    ExperimentNotFound(Uuid),
    #[error("experiment {id} is already {status}")]
    InvalidTransition {
        id: Uuid,
        status: crate::model::ExperimentStatus,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Persistence for trend records and algorithm experiments.
///
/// Writes are last-write-wins upserts keyed on (source, normalized keyword,
/// capture day bucket). Reads never return expired records except
/// [`TrendStore::find_history`], which serves the velocity estimator and is
/// bounded by `since` instead.
#[async_trait]
pub trait TrendStore: Send + Sync {
    /// Insert or overwrite the record for its dedup key. Returns the id the
    /// repository keeps for that key, which is the existing row's id when
    /// the write lands on one.
    async fn upsert_record(&self, record: &TrendRecord) -> Result<Uuid, StoreError>;

    async fn get_record(&self, id: Uuid) -> Result<Option<TrendRecord>, StoreError>;

    /// Non-expired records in any of `stages`, newest capture first.
    async fn find_active(
        &self,
        stages: &[LifecycleStage],
        limit: i64,
    ) -> Result<Vec<TrendRecord>, StoreError>;

    /// All captures of a normalized keyword since `since`, strictly
    /// ascending by `captured_at`. Spans sources and includes expired rows.
    async fn find_history(
        &self,
        keyword_norm: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendRecord>, StoreError>;

    /// Overwrite the record's denormalized prediction fields.
    async fn save_prediction(
        &self,
        trend_id: Uuid,
        peak: &PeakPrediction,
        window: &OpportunityWindow,
    ) -> Result<(), StoreError>;

    async fn record_experiment(&self, experiment: &AlgorithmExperiment) -> Result<(), StoreError>;

    async fn get_experiment(&self, id: Uuid) -> Result<Option<AlgorithmExperiment>, StoreError>;

    /// Persist completion results under a running→completed guard. A second
    /// completion attempt fails with [`StoreError::InvalidTransition`].
    async fn complete_experiment(
        &self,
        id: Uuid,
        outcome: &ExperimentOutcome,
    ) -> Result<(), StoreError>;

    /// Most recently completed experiments, newest first.
    async fn recent_completed_experiments(
        &self,
        limit: i64,
    ) -> Result<Vec<AlgorithmExperiment>, StoreError>;

    /// Delete records whose `expires_at` is at or before `now`; returns how
    /// many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
