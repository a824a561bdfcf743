//! Database operations for the `algorithm_experiments` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trendlab_core::model::{
    AlgorithmExperiment, ExperimentOutcome, ExperimentStatus, StrategySnapshot,
};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `algorithm_experiments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlgorithmExperimentRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trend_public_id: Uuid,
    pub subject_keyword: String,
    pub strategy_a: serde_json::Value,
    pub strategy_b: serde_json::Value,
    pub status: String,
    pub control_performance: Option<f64>,
    pub variant_performance: Option<f64>,
    pub improvement: Option<f64>,
    pub is_significant: Option<bool>,
    pub recommendation: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AlgorithmExperimentRow {
    /// Convert the raw row into the domain experiment.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if a stored value does not parse.
    pub fn into_experiment(self) -> Result<AlgorithmExperiment, DbError> {
        let status: ExperimentStatus = self.status.parse().map_err(|e| DbError::Decode {
            column: "status",
            reason: format!("{e}"),
        })?;

        let strategy_a: StrategySnapshot =
            serde_json::from_value(self.strategy_a).map_err(|e| DbError::Decode {
                column: "strategy_a",
                reason: e.to_string(),
            })?;

        let strategy_b: StrategySnapshot =
            serde_json::from_value(self.strategy_b).map_err(|e| DbError::Decode {
                column: "strategy_b",
                reason: e.to_string(),
            })?;

        Ok(AlgorithmExperiment {
            id: self.public_id,
            trend_id: self.trend_public_id,
            subject_keyword: self.subject_keyword,
            strategy_a,
            strategy_b,
            status,
            control_performance: self.control_performance,
            variant_performance: self.variant_performance,
            improvement: self.improvement,
            is_significant: self.is_significant,
            recommendation: self.recommendation,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a freshly started experiment.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if a strategy snapshot cannot be serialized,
/// or [`DbError::Sqlx`] if the insert fails.
pub async fn insert_experiment(
    pool: &PgPool,
    experiment: &AlgorithmExperiment,
) -> Result<(), DbError> {
    let strategy_a = serde_json::to_value(&experiment.strategy_a).map_err(|e| DbError::Encode {
        column: "strategy_a",
        reason: e.to_string(),
    })?;
    let strategy_b = serde_json::to_value(&experiment.strategy_b).map_err(|e| DbError::Encode {
        column: "strategy_b",
        reason: e.to_string(),
    })?;

    sqlx::query(
        "INSERT INTO algorithm_experiments \
             (public_id, trend_public_id, subject_keyword, strategy_a, \
              strategy_b, status, started_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(experiment.id)
    .bind(experiment.trend_id)
    .bind(&experiment.subject_keyword)
    .bind(strategy_a)
    .bind(strategy_b)
    .bind(experiment.status.to_string())
    .bind(experiment.started_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a single experiment by its `public_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_experiment(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<AlgorithmExperimentRow>, DbError> {
    let row = sqlx::query_as::<_, AlgorithmExperimentRow>(
        "SELECT id, public_id, trend_public_id, subject_keyword, strategy_a, \
                strategy_b, status, control_performance, variant_performance, \
                improvement, is_significant, recommendation, started_at, \
                completed_at, created_at \
         FROM algorithm_experiments \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Persist completion results, guarded so only a `running` experiment can
/// complete. The transition is one-way: a completed experiment is never
/// reopened.
///
/// # Errors
///
/// Returns [`DbError::InvalidExperimentTransition`] if the experiment is
/// missing or already completed, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_experiment(
    pool: &PgPool,
    public_id: Uuid,
    outcome: &ExperimentOutcome,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE algorithm_experiments \
         SET status = 'completed', control_performance = $1, \
             variant_performance = $2, improvement = $3, is_significant = $4, \
             recommendation = $5, completed_at = $6 \
         WHERE public_id = $7 AND status = 'running'",
    )
    .bind(outcome.control_performance)
    .bind(outcome.variant_performance)
    .bind(outcome.improvement)
    .bind(outcome.is_significant)
    .bind(&outcome.recommendation)
    .bind(outcome.completed_at)
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidExperimentTransition {
            id: public_id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Most recently completed experiments, newest completion first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_completed(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<AlgorithmExperimentRow>, DbError> {
    let rows = sqlx::query_as::<_, AlgorithmExperimentRow>(
        "SELECT id, public_id, trend_public_id, subject_keyword, strategy_a, \
                strategy_b, status, control_performance, variant_performance, \
                improvement, is_significant, recommendation, started_at, \
                completed_at, created_at \
         FROM algorithm_experiments \
         WHERE status = 'completed' \
         ORDER BY completed_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
