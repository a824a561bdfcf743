//! Model-backed forecast strategy over the [`ForecastModel`] port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use trendlab_core::model::{PeakForecast, StrategyKind};
use trendlab_core::ports::{ForecastContext, ForecastError, ForecastModel};

use super::PeakStrategy;

/// Delegates to an external forecasting capability, bounding every call
/// with a deadline so one slow forecast cannot stall a batch.
pub struct ModelStrategy {
    model: Arc<dyn ForecastModel>,
    deadline: Duration,
}

impl ModelStrategy {
    #[must_use]
    pub fn new(model: Arc<dyn ForecastModel>, deadline: Duration) -> Self {
        Self { model, deadline }
    }
}

#[async_trait]
impl PeakStrategy for ModelStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Model
    }

    async fn predict(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError> {
        match tokio::time::timeout(self.deadline, self.model.predict_peak(context)).await {
            Ok(result) => result,
            Err(_) => Err(ForecastError::unavailable(format!(
                "forecast timed out after {}ms",
                self.deadline.as_millis()
            ))),
        }
    }
}
