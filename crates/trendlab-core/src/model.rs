//! Shared domain model for the trend intelligence pipeline.
//!
//! Types here are the vocabulary every crate speaks: raw signals coming in
//! from sources, persisted trend records, per-request predictions, and
//! strategy-comparison experiments. Enum variants round-trip through their
//! lowercase text form for storage (`Display` / `FromStr`).

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Fixed retention horizon: a record expires this many days after capture.
pub const RECORD_TTL_DAYS: i64 = 7;

/// Trailing window used when reading a keyword's history for velocity.
pub const HISTORY_WINDOW_DAYS: i64 = 30;

/// Hard cap on the `related_keywords` list of a record.
pub const MAX_RELATED_KEYWORDS: usize = 10;

/// Parse error for the textual form of a domain enum.
#[derive(Debug, Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Maturity stage of a trend, derived from (growth, volume) by the
/// lifecycle classifier. No other code path assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    Emerging,
    Growing,
    Peak,
    Declining,
    Dead,
}

impl LifecycleStage {
    /// All stages except `Dead`: the set batch prediction operates on.
    pub const ACTIVE: [LifecycleStage; 4] = [
        LifecycleStage::Emerging,
        LifecycleStage::Growing,
        LifecycleStage::Peak,
        LifecycleStage::Declining,
    ];
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleStage::Emerging => write!(f, "emerging"),
            LifecycleStage::Growing => write!(f, "growing"),
            LifecycleStage::Peak => write!(f, "peak"),
            LifecycleStage::Declining => write!(f, "declining"),
            LifecycleStage::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for LifecycleStage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emerging" => Ok(LifecycleStage::Emerging),
            "growing" => Ok(LifecycleStage::Growing),
            "peak" => Ok(LifecycleStage::Peak),
            "declining" => Ok(LifecycleStage::Declining),
            "dead" => Ok(LifecycleStage::Dead),
            other => Err(UnknownVariant {
                kind: "lifecycle stage",
                value: other.to_owned(),
            }),
        }
    }
}

/// How soon an opportunity window closes. Ordered so that comparisons and
/// sorting treat `Critical` as the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    /// One step up the ladder, saturating at `Critical`.
    #[must_use]
    pub fn bumped(self) -> Self {
        match self {
            Urgency::Low => Urgency::Medium,
            Urgency::Medium => Urgency::High,
            Urgency::High | Urgency::Critical => Urgency::Critical,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
            Urgency::Critical => write!(f, "critical"),
        }
    }
}

/// Geographic scope of a signal sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    Global,
    Country,
    Region,
    City,
}

impl std::fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoLevel::Global => write!(f, "global"),
            GeoLevel::Country => write!(f, "country"),
            GeoLevel::Region => write!(f, "region"),
            GeoLevel::City => write!(f, "city"),
        }
    }
}

impl FromStr for GeoLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(GeoLevel::Global),
            "country" => Ok(GeoLevel::Country),
            "region" => Ok(GeoLevel::Region),
            "city" => Ok(GeoLevel::City),
            other => Err(UnknownVariant {
                kind: "geo level",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoScope {
    pub level: GeoLevel,
    /// Location name; empty for global scope.
    #[serde(default)]
    pub location: String,
}

impl GeoScope {
    #[must_use]
    pub fn global() -> Self {
        Self {
            level: GeoLevel::Global,
            location: String::new(),
        }
    }
}

impl Default for GeoScope {
    fn default() -> Self {
        Self::global()
    }
}

/// A reference to a piece of top-performing content attached to a trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One raw signal sample as delivered by a [`crate::ports::SignalSource`].
///
/// `competition` and `sentiment` are optional because not every provider
/// reports them; normalization defaults them to neutral values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSignal {
    pub source: String,
    pub keyword: String,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub growth_percent: f64,
    #[serde(default)]
    pub competition: Option<f64>,
    #[serde(default)]
    pub sentiment: Option<f32>,
    #[serde(default)]
    pub geography: GeoScope,
    #[serde(default)]
    pub related_keywords: Vec<String>,
    #[serde(default)]
    pub top_content: Vec<ContentRef>,
    /// Capture time as reported by the provider; `None` means "now".
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

/// One observation of a keyword from one source at one capture time.
///
/// Records only exist in storage when `relevance_score >= 40`; lower scores
/// are filtered out before persistence, not sorted to the bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRecord {
    pub id: Uuid,
    pub source: String,
    pub keyword: String,
    pub volume: i64,
    pub growth_percent: f64,
    /// Competitive pressure on the keyword, 0–100.
    pub competition: f64,
    pub geography: GeoScope,
    pub lifecycle: LifecycleStage,
    /// `None` exactly when lifecycle is `Dead` or volume <= 0.
    pub viral_coefficient: Option<f64>,
    /// Aggregate sentiment in [-1, 1].
    pub sentiment: f32,
    /// Relevance against the business context, 0–100.
    pub relevance_score: i16,
    pub pillars: Vec<String>,
    pub related_keywords: Vec<String>,
    pub top_content: Vec<ContentRef>,
    /// Latest peak forecast; overwritten (last-write-wins) on every
    /// prediction call.
    pub peak_prediction: Option<PeakPrediction>,
    /// Latest opportunity window; overwritten alongside `peak_prediction`.
    pub opportunity_window: Option<OpportunityWindow>,
    pub captured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TrendRecord {
    /// Case-insensitive dedup key component for this record's keyword.
    #[must_use]
    pub fn normalized_keyword(&self) -> String {
        normalize_keyword(&self.keyword)
    }

    /// UTC day bucket the capture falls into; part of the upsert key.
    #[must_use]
    pub fn capture_bucket(&self) -> NaiveDate {
        self.captured_at.date_naive()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Normalize a keyword for dedup and lookups: trim, lowercase, collapse
/// internal whitespace runs to single spaces.
#[must_use]
pub fn normalize_keyword(keyword: &str) -> String {
    WHITESPACE_RE
        .replace_all(keyword.trim(), " ")
        .to_lowercase()
}

/// Which peak-prediction algorithm produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Heuristic,
    Model,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Heuristic => write!(f, "heuristic"),
            StrategyKind::Model => write!(f, "model"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(StrategyKind::Heuristic),
            "model" => Ok(StrategyKind::Model),
            other => Err(UnknownVariant {
                kind: "strategy",
                value: other.to_owned(),
            }),
        }
    }
}

/// Raw output of a single forecasting strategy, before the engine anchors
/// it to a calendar date and a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakForecast {
    pub days_until_peak: i64,
    /// Confidence in the forecast, 0–100.
    pub confidence: u8,
    pub reasoning: String,
}

/// Peak forecast merged onto a [`TrendRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakPrediction {
    pub predicted_peak_at: DateTime<Utc>,
    pub days_until_peak: i64,
    /// Confidence in the forecast, clamped to 0–100.
    pub confidence: u8,
    pub strategy: StrategyKind,
    pub reasoning: String,
}

/// Action window around a predicted peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Whole days until the window closes; never negative.
    pub days_remaining: i64,
    pub urgency: Urgency,
}

/// A point-in-time forecast returned to callers and merged back into the
/// trend record. Not kept as history; each call overwrites the last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPrediction {
    pub trend_id: Uuid,
    pub keyword: String,
    pub predicted_peak_at: DateTime<Utc>,
    pub days_until_peak: i64,
    pub window: OpportunityWindow,
    pub velocity: f64,
    pub acceleration: f64,
    pub confidence: u8,
    pub strategy: StrategyKind,
    pub reasoning: String,
    pub recommended_actions: Vec<String>,
}

impl TrendPrediction {
    /// The subset of this prediction that is denormalized onto the record.
    #[must_use]
    pub fn peak(&self) -> PeakPrediction {
        PeakPrediction {
            predicted_peak_at: self.predicted_peak_at,
            days_until_peak: self.days_until_peak,
            confidence: self.confidence,
            strategy: self.strategy,
            reasoning: self.reasoning.clone(),
        }
    }
}

/// Experiment lifecycle: one-way, never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Running,
    Completed,
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentStatus::Running => write!(f, "running"),
            ExperimentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ExperimentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ExperimentStatus::Running),
            "completed" => Ok(ExperimentStatus::Completed),
            other => Err(UnknownVariant {
                kind: "experiment status",
                value: other.to_owned(),
            }),
        }
    }
}

/// One strategy's prediction captured at experiment-run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySnapshot {
    pub strategy: StrategyKind,
    pub days_until_peak: i64,
    pub confidence: u8,
    pub reasoning: String,
}

/// A paired comparison of both prediction strategies for one trend.
///
/// Strategy A is the heuristic control, strategy B the model variant; both
/// predict from the same trend and velocity input with no interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmExperiment {
    pub id: Uuid,
    pub trend_id: Uuid,
    pub subject_keyword: String,
    pub strategy_a: StrategySnapshot,
    pub strategy_b: StrategySnapshot,
    pub status: ExperimentStatus,
    /// Accuracy of strategy A after completion.
    pub control_performance: Option<f64>,
    /// Accuracy of strategy B after completion.
    pub variant_performance: Option<f64>,
    pub improvement: Option<f64>,
    pub is_significant: Option<bool>,
    pub recommendation: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completion data computed by the experiment tracker when the actual peak
/// date arrives; persisted by the store under a running→completed guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub control_performance: f64,
    pub variant_performance: f64,
    pub improvement: f64,
    pub is_significant: bool,
    pub recommendation: String,
    pub completed_at: DateTime<Utc>,
}

/// Which algorithm the aggregate recommender currently favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAlgorithm {
    Heuristic,
    Model,
    /// Means within 5 accuracy points of each other: average both strategies.
    Hybrid,
}

impl std::fmt::Display for RecommendedAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendedAlgorithm::Heuristic => write!(f, "heuristic"),
            RecommendedAlgorithm::Model => write!(f, "model"),
            RecommendedAlgorithm::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Aggregate verdict over recent completed experiments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmRecommendation {
    pub strategy: RecommendedAlgorithm,
    /// Mean accuracy of the recommended strategy (mean of both for hybrid).
    pub avg_accuracy: f64,
    pub experiment_count: usize,
    pub recommendation: String,
}

/// Expiry timestamp for a capture time under the fixed retention horizon.
#[must_use]
pub fn expiry_for(captured_at: DateTime<Utc>) -> DateTime<Utc> {
    captured_at + Duration::days(RECORD_TTL_DAYS)
}
