//! Stage-conditioned heuristic forecast. Always available, deterministic.

use async_trait::async_trait;
use trendlab_core::model::{LifecycleStage, PeakForecast, StrategyKind};
use trendlab_core::ports::{ForecastContext, ForecastError};

use super::PeakStrategy;

/// Velocity above which an emerging trend is read as breaking out.
pub const BREAKOUT_VELOCITY: f64 = 10.0;

/// Deterministic table keyed on lifecycle stage, refined by velocity and
/// acceleration. DEAD is handled like DECLINING: the peak is behind us.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    /// The table itself, usable without an await point.
    #[must_use]
    pub fn forecast(context: &ForecastContext) -> PeakForecast {
        let (days_until_peak, confidence, reasoning) = match context.lifecycle {
            LifecycleStage::Emerging => {
                if context.velocity > BREAKOUT_VELOCITY && context.acceleration > 0.0 {
                    (3, 70, "accelerating emerging trend, expecting an early peak")
                } else {
                    (7, 60, "emerging trend still building reach")
                }
            }
            LifecycleStage::Growing => {
                if context.acceleration < 0.0 {
                    (2, 75, "growth is decelerating, peak is near")
                } else {
                    (5, 65, "steady growth, peak expected within the week")
                }
            }
            LifecycleStage::Peak => (1, 90, "trend is at peak volume now"),
            LifecycleStage::Declining | LifecycleStage::Dead => {
                (0, 95, "interest is declining, the peak has passed")
            }
        };
        PeakForecast {
            days_until_peak,
            confidence,
            reasoning: format!("Heuristic: {reasoning}"),
        }
    }
}

#[async_trait]
impl PeakStrategy for HeuristicStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Heuristic
    }

    async fn predict(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError> {
        Ok(Self::forecast(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(lifecycle: LifecycleStage, velocity: f64, acceleration: f64) -> ForecastContext {
        ForecastContext {
            keyword: "protein coffee".to_string(),
            lifecycle,
            volume: 20_000,
            growth_percent: 80.0,
            sentiment: 0.2,
            velocity,
            acceleration,
        }
    }

    #[test]
    fn emerging_breakout_peaks_in_three_days() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Emerging, 12.0, 1.0));
        assert_eq!(forecast.days_until_peak, 3);
        assert_eq!(forecast.confidence, 70);
    }

    #[test]
    fn emerging_without_momentum_peaks_in_a_week() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Emerging, 12.0, -0.5));
        assert_eq!(forecast.days_until_peak, 7);
        assert_eq!(forecast.confidence, 60);

        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Emerging, 4.0, 2.0));
        assert_eq!(forecast.days_until_peak, 7);
    }

    #[test]
    fn decelerating_growth_peaks_in_two_days() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Growing, 15.0, -2.0));
        assert_eq!(forecast.days_until_peak, 2);
        assert_eq!(forecast.confidence, 75);
    }

    #[test]
    fn steady_growth_peaks_in_five_days() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Growing, 15.0, 0.0));
        assert_eq!(forecast.days_until_peak, 5);
        assert_eq!(forecast.confidence, 65);
    }

    #[test]
    fn peak_and_declining_answer_immediately() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Peak, 0.0, 0.0));
        assert_eq!((forecast.days_until_peak, forecast.confidence), (1, 90));

        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Declining, 0.0, 0.0));
        assert_eq!((forecast.days_until_peak, forecast.confidence), (0, 95));

        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Dead, 0.0, 0.0));
        assert_eq!((forecast.days_until_peak, forecast.confidence), (0, 95));
    }

    #[test]
    fn reasoning_marks_heuristic_origin() {
        let forecast = HeuristicStrategy::forecast(&context(LifecycleStage::Growing, 1.0, 0.0));
        assert!(forecast.reasoning.starts_with("Heuristic:"));
    }

    #[tokio::test]
    async fn strategy_interface_never_fails() {
        let strategy = HeuristicStrategy;
        assert_eq!(strategy.kind(), StrategyKind::Heuristic);
        let result = strategy
            .predict(&context(LifecycleStage::Peak, 0.0, 0.0))
            .await;
        assert!(result.is_ok());
    }
}
