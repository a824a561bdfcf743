//! Fallback chain: try the primary strategy, answer with the heuristic
//! whenever it fails.

use std::sync::Arc;

use async_trait::async_trait;
use trendlab_core::model::{PeakForecast, StrategyKind};
use trendlab_core::ports::{ForecastContext, ForecastError};

use super::{HeuristicStrategy, PeakStrategy};

/// Wraps a primary strategy with the heuristic as a safety net. A failed
/// primary call is logged and answered heuristically; callers never see the
/// failure, only the reasoning text marks the heuristic origin. Reports the
/// primary's kind so the configured strategy stays visible in predictions.
pub struct FallbackPredictor {
    primary: Arc<dyn PeakStrategy>,
}

impl FallbackPredictor {
    #[must_use]
    pub fn new(primary: Arc<dyn PeakStrategy>) -> Self {
        Self { primary }
    }

    /// Resolves a forecast without an error path.
    pub async fn forecast(&self, context: &ForecastContext) -> PeakForecast {
        match self.primary.predict(context).await {
            Ok(forecast) => forecast,
            Err(err) => {
                tracing::warn!(
                    keyword = %context.keyword,
                    strategy = %self.primary.kind(),
                    error = %err,
                    "peak forecast failed; answering with the heuristic"
                );
                HeuristicStrategy::forecast(context)
            }
        }
    }
}

#[async_trait]
impl PeakStrategy for FallbackPredictor {
    fn kind(&self) -> StrategyKind {
        self.primary.kind()
    }

    async fn predict(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError> {
        Ok(self.forecast(context).await)
    }
}
