//! Postgres-backed implementation of the engine's repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trendlab_core::model::{
    AlgorithmExperiment, ExperimentOutcome, ExperimentStatus, LifecycleStage, OpportunityWindow,
    PeakPrediction, TrendRecord,
};
use trendlab_core::ports::{StoreError, TrendStore};

use crate::{experiments, trend_records, DbError};

/// [`TrendStore`] over a shared [`PgPool`].
#[derive(Debug, Clone)]
pub struct PgTrendStore {
    pool: PgPool,
}

impl PgTrendStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TrendStore for PgTrendStore {
    async fn upsert_record(&self, record: &TrendRecord) -> Result<Uuid, StoreError> {
        trend_records::upsert_trend_record(&self.pool, record)
            .await
            .map_err(StoreError::backend)
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<TrendRecord>, StoreError> {
        trend_records::get_trend_record(&self.pool, id)
            .await
            .map_err(StoreError::backend)?
            .map(|row| row.into_record().map_err(StoreError::backend))
            .transpose()
    }

    async fn find_active(
        &self,
        stages: &[LifecycleStage],
        limit: i64,
    ) -> Result<Vec<TrendRecord>, StoreError> {
        let lifecycles: Vec<String> = stages.iter().map(ToString::to_string).collect();
        let rows = trend_records::find_active_trends(&self.pool, &lifecycles, limit)
            .await
            .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|row| row.into_record().map_err(StoreError::backend))
            .collect()
    }

    async fn find_history(
        &self,
        keyword_norm: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendRecord>, StoreError> {
        let rows = trend_records::find_keyword_history(&self.pool, keyword_norm, since)
            .await
            .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|row| row.into_record().map_err(StoreError::backend))
            .collect()
    }

    async fn save_prediction(
        &self,
        trend_id: Uuid,
        peak: &PeakPrediction,
        window: &OpportunityWindow,
    ) -> Result<(), StoreError> {
        match trend_records::save_trend_prediction(&self.pool, trend_id, peak, window).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound) => Err(StoreError::RecordNotFound(trend_id)),
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    async fn record_experiment(&self, experiment: &AlgorithmExperiment) -> Result<(), StoreError> {
        experiments::insert_experiment(&self.pool, experiment)
            .await
            .map_err(StoreError::backend)
    }

    async fn get_experiment(&self, id: Uuid) -> Result<Option<AlgorithmExperiment>, StoreError> {
        experiments::get_experiment(&self.pool, id)
            .await
            .map_err(StoreError::backend)?
            .map(|row| row.into_experiment().map_err(StoreError::backend))
            .transpose()
    }

    async fn complete_experiment(
        &self,
        id: Uuid,
        outcome: &ExperimentOutcome,
    ) -> Result<(), StoreError> {
        match experiments::complete_experiment(&self.pool, id, outcome).await {
            Ok(()) => Ok(()),
            Err(DbError::InvalidExperimentTransition { .. }) => {
                // The guard rejects both a missing row and a finished one;
                // look the row up to report which it was.
                let existing = experiments::get_experiment(&self.pool, id)
                    .await
                    .map_err(StoreError::backend)?;
                match existing {
                    None => Err(StoreError::ExperimentNotFound(id)),
                    Some(_) => Err(StoreError::InvalidTransition {
                        id,
                        status: ExperimentStatus::Completed,
                    }),
                }
            }
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    async fn recent_completed_experiments(
        &self,
        limit: i64,
    ) -> Result<Vec<AlgorithmExperiment>, StoreError> {
        let rows = experiments::list_recent_completed(&self.pool, limit)
            .await
            .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|row| row.into_experiment().map_err(StoreError::backend))
            .collect()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        trend_records::purge_expired_trends(&self.pool, now)
            .await
            .map_err(StoreError::backend)
    }
}
