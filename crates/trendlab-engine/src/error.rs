//! Engine error taxonomy.

use trendlab_core::ports::StoreError;
use uuid::Uuid;

/// Errors surfaced by engine operations.
///
/// Scorer and forecast trouble never appears here: both are recovered
/// internally (neutral score, heuristic forecast) and only logged.
/// Repository errors surface unchanged; the engine never silently retries
/// writes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("trend {0} not found")]
    TrendNotFound(Uuid),

    #[error("experiment {0} not found")]
    ExperimentNotFound(Uuid),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordNotFound(id) => Self::TrendNotFound(id),
            StoreError::ExperimentNotFound(id) => Self::ExperimentNotFound(id),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_lookup_failures_map_to_not_found() {
        let id = Uuid::new_v4();
        let err = EngineError::from(StoreError::RecordNotFound(id));
        assert!(matches!(err, EngineError::TrendNotFound(found) if found == id));

        let err = EngineError::from(StoreError::ExperimentNotFound(id));
        assert!(matches!(err, EngineError::ExperimentNotFound(found) if found == id));
    }

    #[test]
    fn backend_failures_pass_through() {
        let err = EngineError::from(StoreError::Backend("connection reset".to_string()));
        assert!(matches!(err, EngineError::Store(StoreError::Backend(_))));
        assert!(err.to_string().contains("connection reset"));
    }
}
