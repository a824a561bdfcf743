//! Peak-prediction strategies behind one interface.
//!
//! Two strategies exist: a deterministic stage-conditioned heuristic and a
//! model-backed forecast. Callers compose them through [`FallbackPredictor`]
//! so a dead model endpoint degrades to the heuristic answer instead of an
//! error. Adding a third strategy means implementing [`PeakStrategy`] and
//! swapping it in; callers stay untouched.

mod fallback;
mod heuristic;
mod model;

pub use fallback::FallbackPredictor;
pub use heuristic::HeuristicStrategy;
pub use model::ModelStrategy;

use async_trait::async_trait;
use trendlab_core::model::{PeakForecast, StrategyKind};
use trendlab_core::ports::{ForecastContext, ForecastError};

/// A peak-prediction algorithm. Outputs carry days-until-peak in a
/// non-negative range and confidence within 0 to 100.
#[async_trait]
pub trait PeakStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// # Errors
    ///
    /// Model-backed strategies fail on transport trouble or malformed
    /// responses; the heuristic never does.
    async fn predict(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError>;
}
