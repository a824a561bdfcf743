//! In-memory store and scripted collaborator fakes for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use trendlab_core::context::{BusinessContext, Pillar};
use trendlab_core::model::{
    expiry_for, AlgorithmExperiment, ExperimentOutcome, ExperimentStatus, GeoScope,
    LifecycleStage, OpportunityWindow, PeakForecast, PeakPrediction, RawSignal, TrendRecord,
};
use trendlab_core::ports::{
    FetchParams, ForecastContext, ForecastError, ForecastModel, RelevanceScorer, ScoreError,
    SignalSource, SourceError, StoreError, TrendStore,
};
use trendlab_core::usage::SourceUsage;

// ---------------------------------------------------------------------------
// In-memory trend store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, TrendRecord>>,
    experiments: Mutex<HashMap<Uuid, AlgorithmExperiment>>,
    /// Flip on to make every upsert fail, for error-list assertions.
    pub fail_upserts: AtomicBool,
}

impl MemoryStore {
    pub async fn insert_record(&self, record: TrendRecord) {
        self.records.lock().await.insert(record.id, record);
    }

    pub async fn insert_experiment(&self, experiment: AlgorithmExperiment) {
        self.experiments
            .lock()
            .await
            .insert(experiment.id, experiment);
    }

    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

fn dedup_key(record: &TrendRecord) -> (String, String, chrono::NaiveDate) {
    (
        record.source.clone(),
        record.normalized_keyword(),
        record.capture_bucket(),
    )
}

#[async_trait]
impl TrendStore for MemoryStore {
    async fn upsert_record(&self, record: &TrendRecord) -> Result<Uuid, StoreError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::backend("upsert disabled"));
        }
        let mut records = self.records.lock().await;
        let key = dedup_key(record);
        if let Some(existing) = records.values_mut().find(|r| dedup_key(r) == key) {
            let id = existing.id;
            let mut replacement = record.clone();
            replacement.id = id;
            replacement.peak_prediction = existing.peak_prediction.clone();
            replacement.opportunity_window = existing.opportunity_window.clone();
            *existing = replacement;
            return Ok(id);
        }
        records.insert(record.id, record.clone());
        Ok(record.id)
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<TrendRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&id)
            .filter(|r| !r.is_expired(Utc::now()))
            .cloned())
    }

    async fn find_active(
        &self,
        stages: &[LifecycleStage],
        limit: i64,
    ) -> Result<Vec<TrendRecord>, StoreError> {
        let records = self.records.lock().await;
        let now = Utc::now();
        let mut active: Vec<TrendRecord> = records
            .values()
            .filter(|r| !r.is_expired(now) && stages.contains(&r.lifecycle))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        active.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(active)
    }

    async fn find_history(
        &self,
        keyword_norm: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut history: Vec<TrendRecord> = records
            .values()
            .filter(|r| r.normalized_keyword() == keyword_norm && r.captured_at >= since)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.captured_at.cmp(&b.captured_at));
        Ok(history)
    }

    async fn save_prediction(
        &self,
        trend_id: Uuid,
        peak: &PeakPrediction,
        window: &OpportunityWindow,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&trend_id)
            .ok_or(StoreError::RecordNotFound(trend_id))?;
        record.peak_prediction = Some(peak.clone());
        record.opportunity_window = Some(window.clone());
        Ok(())
    }

    async fn record_experiment(&self, experiment: &AlgorithmExperiment) -> Result<(), StoreError> {
        self.experiments
            .lock()
            .await
            .insert(experiment.id, experiment.clone());
        Ok(())
    }

    async fn get_experiment(&self, id: Uuid) -> Result<Option<AlgorithmExperiment>, StoreError> {
        Ok(self.experiments.lock().await.get(&id).cloned())
    }

    async fn complete_experiment(
        &self,
        id: Uuid,
        outcome: &ExperimentOutcome,
    ) -> Result<(), StoreError> {
        let mut experiments = self.experiments.lock().await;
        let experiment = experiments
            .get_mut(&id)
            .ok_or(StoreError::ExperimentNotFound(id))?;
        if experiment.status == ExperimentStatus::Completed {
            return Err(StoreError::InvalidTransition {
                id,
                status: ExperimentStatus::Completed,
            });
        }
        experiment.status = ExperimentStatus::Completed;
        experiment.control_performance = Some(outcome.control_performance);
        experiment.variant_performance = Some(outcome.variant_performance);
        experiment.improvement = Some(outcome.improvement);
        experiment.is_significant = Some(outcome.is_significant);
        experiment.recommendation = Some(outcome.recommendation.clone());
        experiment.completed_at = Some(outcome.completed_at);
        Ok(())
    }

    async fn recent_completed_experiments(
        &self,
        limit: i64,
    ) -> Result<Vec<AlgorithmExperiment>, StoreError> {
        let experiments = self.experiments.lock().await;
        let mut completed: Vec<AlgorithmExperiment> = experiments
            .values()
            .filter(|e| e.status == ExperimentStatus::Completed)
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        completed.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(completed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| !r.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

/// Signal source that serves a fixed batch, or fails outright, while
/// keeping its own usage counter the way real sources do.
pub struct StaticSource {
    name: String,
    signals: Vec<RawSignal>,
    fail: bool,
    pub usage: Arc<SourceUsage>,
}

impl StaticSource {
    pub fn serving(name: &str, signals: Vec<RawSignal>) -> Self {
        Self {
            name: name.to_string(),
            signals,
            fail: false,
            usage: Arc::new(SourceUsage::new(name)),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signals: Vec::new(),
            fail: true,
            usage: Arc::new(SourceUsage::new(name)),
        }
    }
}

#[async_trait]
impl SignalSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_signals(&self, _params: &FetchParams) -> Result<Vec<RawSignal>, SourceError> {
        self.usage.record_request();
        if self.fail {
            self.usage.record_failure();
            return Err(SourceError::unavailable("provider outage"));
        }
        self.usage.record_signals(self.signals.len() as u64);
        Ok(self.signals.clone())
    }
}

/// Scorer that answers from a keyword table, with a default for the rest.
pub struct ScriptedScorer {
    scores: HashMap<String, u8>,
    default: u8,
}

impl ScriptedScorer {
    pub fn with_default(default: u8) -> Self {
        Self {
            scores: HashMap::new(),
            default,
        }
    }

    pub fn with_score(mut self, keyword: &str, score: u8) -> Self {
        self.scores.insert(keyword.to_string(), score);
        self
    }
}

#[async_trait]
impl RelevanceScorer for ScriptedScorer {
    async fn score(&self, signal: &RawSignal) -> Result<u8, ScoreError> {
        Ok(self
            .scores
            .get(&signal.keyword)
            .copied()
            .unwrap_or(self.default))
    }
}

/// Forecast model that always answers with one forecast, or always fails.
pub struct ScriptedForecast {
    forecast: Option<PeakForecast>,
    pub calls: AtomicUsize,
}

impl ScriptedForecast {
    pub fn healthy(days_until_peak: i64, confidence: u8, reasoning: &str) -> Self {
        Self {
            forecast: Some(PeakForecast {
                days_until_peak,
                confidence,
                reasoning: reasoning.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            forecast: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ForecastModel for ScriptedForecast {
    async fn predict_peak(
        &self,
        _context: &ForecastContext,
    ) -> Result<PeakForecast, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.forecast {
            Some(forecast) => Ok(forecast.clone()),
            None => Err(ForecastError::unavailable("model endpoint down")),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn business_context() -> BusinessContext {
    BusinessContext {
        description: "Functional beverage brand for fitness audiences".to_string(),
        pillars: vec![
            Pillar {
                name: "coffee-culture".to_string(),
                keywords: vec!["coffee".to_string(), "espresso".to_string()],
            },
            Pillar {
                name: "fitness-nutrition".to_string(),
                keywords: vec!["protein".to_string(), "pre workout".to_string()],
            },
        ],
    }
}

pub fn signal(source: &str, keyword: &str, volume: i64, growth_percent: f64) -> RawSignal {
    RawSignal {
        source: source.to_string(),
        keyword: keyword.to_string(),
        volume,
        growth_percent,
        competition: Some(40.0),
        sentiment: Some(0.3),
        geography: GeoScope::global(),
        related_keywords: vec!["gym coffee".to_string()],
        top_content: Vec::new(),
        captured_at: None,
    }
}

/// A stored record as the collection pipeline would have produced it.
pub fn record(
    keyword: &str,
    lifecycle: LifecycleStage,
    growth_percent: f64,
    volume: i64,
    captured_at: DateTime<Utc>,
) -> TrendRecord {
    TrendRecord {
        id: Uuid::new_v4(),
        source: "search".to_string(),
        keyword: keyword.to_string(),
        volume,
        growth_percent,
        competition: 40.0,
        geography: GeoScope::global(),
        lifecycle,
        viral_coefficient: None,
        sentiment: 0.2,
        relevance_score: 80,
        pillars: Vec::new(),
        related_keywords: Vec::new(),
        top_content: Vec::new(),
        peak_prediction: None,
        opportunity_window: None,
        captured_at,
        expires_at: expiry_for(captured_at),
    }
}

/// Days-ago helper anchored near now so records stay unexpired.
pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}
