//! The engine facade: every operation the core exposes to callers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use trendlab_core::app_config::AppConfig;
use trendlab_core::context::BusinessContext;
use trendlab_core::model::{
    expiry_for, AlgorithmExperiment, AlgorithmRecommendation, ExperimentOutcome, LifecycleStage,
    PeakForecast, RawSignal, StrategyKind, StrategySnapshot, TrendPrediction, TrendRecord,
    Urgency, HISTORY_WINDOW_DAYS, MAX_RELATED_KEYWORDS,
};
use trendlab_core::ports::{
    FetchParams, ForecastContext, ForecastModel, RelevanceScorer, SignalSource, TrendStore,
};

use crate::error::EngineError;
use crate::predictor::{FallbackPredictor, HeuristicStrategy, ModelStrategy, PeakStrategy};
use crate::relevance::{self, RelevanceGate};
use crate::velocity::{self, GrowthPoint, VelocityEstimate};
use crate::{actions, experiment, lifecycle, viral, window};

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

/// Earliest peak distance that still counts as an early signal.
pub const EARLY_SIGNAL_MIN_DAYS: i64 = 7;
/// Latest peak distance that still counts as an early signal.
pub const EARLY_SIGNAL_MAX_DAYS: i64 = 14;
/// Confidence floor for early signals.
pub const EARLY_SIGNAL_MIN_CONFIDENCE: u8 = 60;

/// Neutral competition assumed when a provider does not report one.
const DEFAULT_COMPETITION: f64 = 50.0;

const DEFAULT_SCORER_DEADLINE_SECS: u64 = 10;
const DEFAULT_FORECAST_DEADLINE_SECS: u64 = 20;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_ACTIVE_LIMIT: i64 = 100;

/// Operational knobs for the engine. Business thresholds are deliberately
/// not in here; they are named constants in their modules.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scorer_deadline: Duration,
    pub forecast_deadline: Duration,
    pub collect_concurrency: usize,
    pub predict_concurrency: usize,
    pub active_trend_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scorer_deadline: Duration::from_secs(DEFAULT_SCORER_DEADLINE_SECS),
            forecast_deadline: Duration::from_secs(DEFAULT_FORECAST_DEADLINE_SECS),
            collect_concurrency: DEFAULT_CONCURRENCY,
            predict_concurrency: DEFAULT_CONCURRENCY,
            active_trend_limit: DEFAULT_ACTIVE_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Engine knobs from the application configuration. Concurrency limits
    /// are raised to at least 1; a zero limit would stall the batch streams.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            scorer_deadline: Duration::from_secs(config.scorer_timeout_secs),
            forecast_deadline: Duration::from_secs(config.forecast_timeout_secs),
            collect_concurrency: config.collect_max_concurrent.max(1),
            predict_concurrency: config.predict_max_concurrent.max(1),
            active_trend_limit: config.active_trend_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// Result of one collection pass. Partial failures land in `errors`
/// without aborting the rest of the batch.
#[derive(Debug, Default, Serialize)]
pub struct CollectSummary {
    /// Signals fetched across all sources, before filtering.
    pub collected: usize,
    /// Records that cleared the relevance threshold and were persisted.
    pub stored: usize,
    /// Stored records per source name.
    pub by_source: BTreeMap<String, usize>,
    pub errors: Vec<CollectFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectFailure {
    pub source: String,
    /// `None` when the whole source fetch failed rather than one signal.
    pub keyword: Option<String>,
    pub message: String,
}

/// Predictions for every active trend plus the items that failed.
#[derive(Debug, Default, Serialize)]
pub struct PredictionBatch {
    pub predictions: Vec<TrendPrediction>,
    pub errors: Vec<PredictFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictFailure {
    pub trend_id: Uuid,
    pub keyword: String,
    pub message: String,
}

enum SignalOutcome {
    Stored { source: String },
    Discarded,
    Failed(CollectFailure),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The trend intelligence engine: collection, staging, prediction,
/// opportunity windows, and algorithm experiments over injected
/// collaborator ports.
pub struct TrendEngine {
    store: Arc<dyn TrendStore>,
    gate: RelevanceGate,
    context: BusinessContext,
    predictor: FallbackPredictor,
    collect_concurrency: usize,
    predict_concurrency: usize,
    active_limit: i64,
}

impl TrendEngine {
    /// Wires the engine from its collaborators. Passing `None` for the
    /// forecast model leaves the heuristic as the only strategy; otherwise
    /// the model strategy runs behind the heuristic fallback chain.
    #[must_use]
    pub fn new(
        store: Arc<dyn TrendStore>,
        scorer: Arc<dyn RelevanceScorer>,
        forecast: Option<Arc<dyn ForecastModel>>,
        context: BusinessContext,
        config: &EngineConfig,
    ) -> Self {
        let primary: Arc<dyn PeakStrategy> = match forecast {
            Some(model) => Arc::new(ModelStrategy::new(model, config.forecast_deadline)),
            None => Arc::new(HeuristicStrategy),
        };
        Self {
            store,
            gate: RelevanceGate::new(scorer, config.scorer_deadline),
            context,
            predictor: FallbackPredictor::new(primary),
            collect_concurrency: config.collect_concurrency.max(1),
            predict_concurrency: config.predict_concurrency.max(1),
            active_limit: config.active_trend_limit,
        }
    }

    // -- collection --------------------------------------------------------

    /// Fetches signals from every source, scores them against the business
    /// context, and persists the ones that clear the relevance threshold.
    /// One source or signal failing never aborts the others.
    pub async fn collect_and_score(
        &self,
        sources: &[Arc<dyn SignalSource>],
        params: &FetchParams,
    ) -> CollectSummary {
        let fetched: Vec<Result<Vec<RawSignal>, CollectFailure>> = stream::iter(
            sources
                .iter()
                .map(|source| self.fetch_from(Arc::clone(source), params)),
        )
        .buffer_unordered(self.collect_concurrency)
        .collect()
        .await;

        let mut summary = CollectSummary::default();
        let mut pending = Vec::new();
        for outcome in fetched {
            match outcome {
                Ok(signals) => {
                    summary.collected += signals.len();
                    pending.extend(signals);
                }
                Err(failure) => summary.errors.push(failure),
            }
        }

        let outcomes: Vec<SignalOutcome> =
            stream::iter(pending.into_iter().map(|signal| self.score_and_store(signal)))
                .buffer_unordered(self.collect_concurrency)
                .collect()
                .await;

        for outcome in outcomes {
            match outcome {
                SignalOutcome::Stored { source } => {
                    summary.stored += 1;
                    *summary.by_source.entry(source).or_insert(0) += 1;
                }
                SignalOutcome::Discarded => {}
                SignalOutcome::Failed(failure) => summary.errors.push(failure),
            }
        }

        tracing::info!(
            collected = summary.collected,
            stored = summary.stored,
            failed = summary.errors.len(),
            "collection pass finished"
        );
        summary
    }

    async fn fetch_from(
        &self,
        source: Arc<dyn SignalSource>,
        params: &FetchParams,
    ) -> Result<Vec<RawSignal>, CollectFailure> {
        let name = source.name().to_string();
        match source.fetch_signals(params).await {
            Ok(signals) => {
                tracing::debug!(source = %name, count = signals.len(), "fetched signals");
                Ok(signals)
            }
            Err(err) => {
                tracing::warn!(source = %name, error = %err, "signal source failed");
                Err(CollectFailure {
                    source: name,
                    keyword: None,
                    message: err.to_string(),
                })
            }
        }
    }

    async fn score_and_store(&self, signal: RawSignal) -> SignalOutcome {
        let source = signal.source.clone();
        let keyword = signal.keyword.clone();
        let score = self.gate.score(&signal).await;
        if !relevance::meets_threshold(score) {
            tracing::debug!(keyword = %keyword, score, "signal below relevance threshold; discarded");
            return SignalOutcome::Discarded;
        }
        let record = self.normalize(signal, score);
        match self.store.upsert_record(&record).await {
            Ok(_) => SignalOutcome::Stored { source },
            Err(err) => {
                tracing::warn!(keyword = %keyword, error = %err, "failed to store trend record");
                SignalOutcome::Failed(CollectFailure {
                    source,
                    keyword: Some(keyword),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Builds the persistent record for a signal that cleared the gate.
    /// Lifecycle comes from the classifier and nowhere else.
    fn normalize(&self, signal: RawSignal, relevance_score: u8) -> TrendRecord {
        let captured_at = signal.captured_at.unwrap_or_else(Utc::now);
        let volume = signal.volume.max(0);
        let lifecycle = lifecycle::classify(signal.growth_percent, volume);
        let viral_coefficient = viral::viral_coefficient(signal.growth_percent, volume, lifecycle);
        let pillars = self
            .context
            .matching_pillars(&signal.keyword, &signal.related_keywords);
        let mut related_keywords = signal.related_keywords;
        related_keywords.truncate(MAX_RELATED_KEYWORDS);

        TrendRecord {
            id: Uuid::new_v4(),
            source: signal.source,
            keyword: signal.keyword,
            volume,
            growth_percent: signal.growth_percent,
            competition: signal
                .competition
                .unwrap_or(DEFAULT_COMPETITION)
                .clamp(0.0, 100.0),
            geography: signal.geography,
            lifecycle,
            viral_coefficient,
            sentiment: signal.sentiment.unwrap_or(0.0).clamp(-1.0, 1.0),
            relevance_score: i16::from(relevance_score),
            pillars,
            related_keywords,
            top_content: signal.top_content,
            peak_prediction: None,
            opportunity_window: None,
            captured_at,
            expires_at: expiry_for(captured_at),
        }
    }

    // -- prediction --------------------------------------------------------

    /// Predicts the peak for one trend and merges the result back into its
    /// record (last-write-wins).
    ///
    /// # Errors
    ///
    /// [`EngineError::TrendNotFound`] for unknown or expired ids;
    /// repository failures surface as [`EngineError::Store`].
    pub async fn predict_peak(&self, trend_id: Uuid) -> Result<TrendPrediction, EngineError> {
        let record = self
            .store
            .get_record(trend_id)
            .await?
            .ok_or(EngineError::TrendNotFound(trend_id))?;
        self.predict_for_record(&record).await
    }

    /// Predicts every active trend. Per-item failures are collected, not
    /// propagated; the batch always returns its partial successes.
    ///
    /// # Errors
    ///
    /// Only listing the active trends can fail the whole batch.
    pub async fn predict_all_active(&self) -> Result<PredictionBatch, EngineError> {
        let active = self
            .store
            .find_active(&LifecycleStage::ACTIVE, self.active_limit)
            .await?;
        let outcomes: Vec<(&TrendRecord, Result<TrendPrediction, EngineError>)> =
            stream::iter(active.iter().map(|record| async move {
                (record, self.predict_for_record(record).await)
            }))
            .buffer_unordered(self.predict_concurrency)
            .collect()
            .await;

        let mut batch = PredictionBatch::default();
        for (record, outcome) in outcomes {
            match outcome {
                Ok(prediction) => batch.predictions.push(prediction),
                Err(err) => {
                    tracing::warn!(
                        trend_id = %record.id,
                        keyword = %record.keyword,
                        error = %err,
                        "prediction failed for trend"
                    );
                    batch.errors.push(PredictFailure {
                        trend_id: record.id,
                        keyword: record.keyword.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        batch
            .predictions
            .sort_by(|a, b| {
                a.days_until_peak
                    .cmp(&b.days_until_peak)
                    .then_with(|| a.keyword.cmp(&b.keyword))
            });
        tracing::info!(
            predicted = batch.predictions.len(),
            failed = batch.errors.len(),
            "active trend prediction finished"
        );
        Ok(batch)
    }

    /// Active predictions whose window urgency is CRITICAL or HIGH, most
    /// urgent first, closest window first within a level.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::predict_all_active`].
    pub async fn urgent_opportunities(&self) -> Result<Vec<TrendPrediction>, EngineError> {
        let batch = self.predict_all_active().await?;
        let mut urgent: Vec<TrendPrediction> = batch
            .predictions
            .into_iter()
            .filter(|p| matches!(p.window.urgency, Urgency::Critical | Urgency::High))
            .collect();
        urgent.sort_by(|a, b| {
            b.window
                .urgency
                .cmp(&a.window.urgency)
                .then(a.window.days_remaining.cmp(&b.window.days_remaining))
        });
        Ok(urgent)
    }

    /// Active predictions peaking 7 to 14 days out with confidence of at
    /// least 60: far enough to prepare for, near enough to be credible.
    /// Sorted by descending confidence.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::predict_all_active`].
    pub async fn early_signals(&self) -> Result<Vec<TrendPrediction>, EngineError> {
        let batch = self.predict_all_active().await?;
        let mut early: Vec<TrendPrediction> = batch
            .predictions
            .into_iter()
            .filter(|p| {
                (EARLY_SIGNAL_MIN_DAYS..=EARLY_SIGNAL_MAX_DAYS).contains(&p.days_until_peak)
                    && p.confidence >= EARLY_SIGNAL_MIN_CONFIDENCE
            })
            .collect();
        early.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        Ok(early)
    }

    async fn predict_for_record(
        &self,
        record: &TrendRecord,
    ) -> Result<TrendPrediction, EngineError> {
        let (context, estimate) = self.trend_dynamics(record).await?;
        let forecast = self.predictor.forecast(&context).await;

        let now = Utc::now();
        let predicted_peak_at = now + chrono::Duration::days(forecast.days_until_peak);
        let window = window::opportunity_window(predicted_peak_at, estimate.velocity, now);
        let recommended_actions = actions::recommended_actions(record.lifecycle, window.urgency);

        let prediction = TrendPrediction {
            trend_id: record.id,
            keyword: record.keyword.clone(),
            predicted_peak_at,
            days_until_peak: forecast.days_until_peak,
            window,
            velocity: estimate.velocity,
            acceleration: estimate.acceleration,
            confidence: forecast.confidence,
            strategy: self.predictor.kind(),
            reasoning: forecast.reasoning,
            recommended_actions,
        };
        self.store
            .save_prediction(record.id, &prediction.peak(), &prediction.window)
            .await?;
        Ok(prediction)
    }

    /// Velocity estimate plus forecast context from the keyword's trailing
    /// history. The history read is strictly ascending by capture time.
    async fn trend_dynamics(
        &self,
        record: &TrendRecord,
    ) -> Result<(ForecastContext, VelocityEstimate), EngineError> {
        let since = Utc::now() - chrono::Duration::days(HISTORY_WINDOW_DAYS);
        let history = self
            .store
            .find_history(&record.normalized_keyword(), since)
            .await?;
        let series: Vec<GrowthPoint> = history.iter().map(GrowthPoint::from).collect();
        let estimate = velocity::estimate(&series);
        let context = ForecastContext::from_record(record, estimate.velocity, estimate.acceleration);
        Ok((context, estimate))
    }

    // -- experiments -------------------------------------------------------

    /// Runs both strategies side by side on one trend and records the pair
    /// as a RUNNING experiment. Purely observational.
    ///
    /// # Errors
    ///
    /// [`EngineError::TrendNotFound`] for unknown ids; repository failures
    /// surface as [`EngineError::Store`].
    pub async fn run_experiment(
        &self,
        trend_id: Uuid,
    ) -> Result<AlgorithmExperiment, EngineError> {
        let record = self
            .store
            .get_record(trend_id)
            .await?
            .ok_or(EngineError::TrendNotFound(trend_id))?;
        let (context, _) = self.trend_dynamics(&record).await?;

        let control = HeuristicStrategy::forecast(&context);
        let variant = self.predictor.forecast(&context).await;

        let experiment = experiment::open_experiment(
            &record,
            snapshot(StrategyKind::Heuristic, control),
            snapshot(self.predictor.kind(), variant),
            Utc::now(),
        );
        self.store.record_experiment(&experiment).await?;
        tracing::info!(
            experiment_id = %experiment.id,
            keyword = %experiment.subject_keyword,
            "experiment opened"
        );
        Ok(experiment)
    }

    /// Scores a running experiment against the observed peak date and
    /// persists the completion. One-way: a completed experiment cannot be
    /// completed again.
    ///
    /// # Errors
    ///
    /// [`EngineError::ExperimentNotFound`] for unknown ids; a repeated
    /// completion surfaces the store's invalid-transition error.
    pub async fn complete_experiment(
        &self,
        experiment_id: Uuid,
        actual_peak_at: chrono::DateTime<Utc>,
    ) -> Result<ExperimentOutcome, EngineError> {
        let experiment = self
            .store
            .get_experiment(experiment_id)
            .await?
            .ok_or(EngineError::ExperimentNotFound(experiment_id))?;
        let outcome = experiment::score_outcome(&experiment, actual_peak_at, Utc::now());
        self.store
            .complete_experiment(experiment_id, &outcome)
            .await?;
        tracing::info!(
            experiment_id = %experiment_id,
            control = outcome.control_performance,
            variant = outcome.variant_performance,
            significant = outcome.is_significant,
            "experiment completed"
        );
        Ok(outcome)
    }

    /// Aggregate strategy recommendation over the recent completed
    /// experiments.
    ///
    /// # Errors
    ///
    /// Repository failures surface as [`EngineError::Store`].
    pub async fn best_algorithm(&self) -> Result<AlgorithmRecommendation, EngineError> {
        let completed = self
            .store
            .recent_completed_experiments(experiment::RECOMMENDATION_WINDOW)
            .await?;
        Ok(experiment::recommend(&completed))
    }

    // -- maintenance -------------------------------------------------------

    /// Deletes records past their expiry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Repository failures surface as [`EngineError::Store`].
    pub async fn purge_expired(&self) -> Result<u64, EngineError> {
        let purged = self.store.purge_expired(Utc::now()).await?;
        tracing::info!(purged, "expired trend records purged");
        Ok(purged)
    }
}

fn snapshot(strategy: StrategyKind, forecast: PeakForecast) -> StrategySnapshot {
    StrategySnapshot {
        strategy,
        days_until_peak: forecast.days_until_peak,
        confidence: forecast.confidence,
        reasoning: forecast.reasoning,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use trendlab_core::app_config::Environment;

    fn app_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/trendlab".to_string(),
            env: Environment::Test,
            log_level: "info".to_string(),
            context_path: PathBuf::from("./config/business.yaml"),
            model_base_url: None,
            model_api_key: None,
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            model_request_timeout_secs: 20,
            model_max_retries: 2,
            model_retry_backoff_base_ms: 500,
            scorer_timeout_secs: 7,
            forecast_timeout_secs: 13,
            collect_max_concurrent: 0,
            predict_max_concurrent: 8,
            active_trend_limit: 250,
        }
    }

    #[test]
    fn engine_config_maps_app_config_knobs() {
        let config = EngineConfig::from_app_config(&app_config());
        assert_eq!(config.scorer_deadline, Duration::from_secs(7));
        assert_eq!(config.forecast_deadline, Duration::from_secs(13));
        assert_eq!(config.predict_concurrency, 8);
        assert_eq!(config.active_trend_limit, 250);
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let config = EngineConfig::from_app_config(&app_config());
        assert_eq!(config.collect_concurrency, 1);
    }
}
