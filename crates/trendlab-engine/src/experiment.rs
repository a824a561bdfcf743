//! Algorithm experiments: paired strategy scoring and the aggregate
//! recommendation over recent outcomes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use trendlab_core::model::{
    AlgorithmExperiment, AlgorithmRecommendation, ExperimentOutcome, ExperimentStatus,
    RecommendedAlgorithm, StrategyKind, StrategySnapshot, TrendRecord,
};

/// Accuracy-point gap above which a result counts as significant. A fixed
/// heuristic bar, not a statistical test.
pub const SIGNIFICANCE_MARGIN: f64 = 10.0;
/// How many recent completed experiments feed the aggregate recommendation.
pub const RECOMMENDATION_WINDOW: i64 = 50;
/// Mean-accuracy gap under which the recommender calls for blending both
/// strategies instead of picking one.
pub const HYBRID_MARGIN: f64 = 5.0;

/// Assembles a RUNNING experiment from both strategies' snapshots of the
/// same trend and velocity input. Purely observational: the strategies do
/// not interact.
#[must_use]
pub fn open_experiment(
    trend: &TrendRecord,
    strategy_a: StrategySnapshot,
    strategy_b: StrategySnapshot,
    started_at: DateTime<Utc>,
) -> AlgorithmExperiment {
    AlgorithmExperiment {
        id: Uuid::new_v4(),
        trend_id: trend.id,
        subject_keyword: trend.keyword.clone(),
        strategy_a,
        strategy_b,
        status: ExperimentStatus::Running,
        control_performance: None,
        variant_performance: None,
        improvement: None,
        is_significant: None,
        recommendation: None,
        started_at,
        completed_at: None,
    }
}

/// Accuracy of a day-count prediction against the observed day count:
/// `max(0, 100 - error / max(actual, 1) * 100)`. A perfect prediction
/// scores exactly 100; being wrong by more than the actual span floors
/// at 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(predicted_days: i64, actual_days: i64) -> f64 {
    let error = (predicted_days - actual_days).abs() as f64;
    let scale = actual_days.max(1) as f64;
    (100.0 - error / scale * 100.0).max(0.0)
}

/// Accuracy gap between the two strategies and whether it clears the
/// significance bar.
#[must_use]
pub fn compare_accuracies(control: f64, variant: f64) -> (f64, bool) {
    let gap = (control - variant).abs();
    (gap, gap > SIGNIFICANCE_MARGIN)
}

/// Scores a running experiment against the observed peak date.
#[must_use]
pub fn score_outcome(
    experiment: &AlgorithmExperiment,
    actual_peak_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> ExperimentOutcome {
    let actual_days = (actual_peak_at - experiment.started_at).num_days();
    let control = accuracy(experiment.strategy_a.days_until_peak, actual_days);
    let variant = accuracy(experiment.strategy_b.days_until_peak, actual_days);
    let (improvement, is_significant) = compare_accuracies(control, variant);
    let recommendation = verdict(
        experiment.strategy_a.strategy,
        experiment.strategy_b.strategy,
        control,
        variant,
        improvement,
        is_significant,
    );
    ExperimentOutcome {
        control_performance: control,
        variant_performance: variant,
        improvement,
        is_significant,
        recommendation,
        completed_at,
    }
}

fn verdict(
    a: StrategyKind,
    b: StrategyKind,
    control: f64,
    variant: f64,
    improvement: f64,
    is_significant: bool,
) -> String {
    if !is_significant {
        return format!("no significant difference between {a} and {b} (gap {improvement:.1} points)");
    }
    let (winner, loser) = if control >= variant { (a, b) } else { (b, a) };
    format!("{winner} beat {loser} by {improvement:.1} accuracy points")
}

/// Aggregate verdict over recent completed experiments: per-strategy mean
/// accuracy, a hybrid call when the means sit within [`HYBRID_MARGIN`] of
/// each other, otherwise the higher mean wins.
#[must_use]
pub fn recommend(completed: &[AlgorithmExperiment]) -> AlgorithmRecommendation {
    let mut heuristic = Tally::default();
    let mut model = Tally::default();
    for experiment in completed {
        if let Some(score) = experiment.control_performance {
            tally_for(&mut heuristic, &mut model, experiment.strategy_a.strategy).add(score);
        }
        if let Some(score) = experiment.variant_performance {
            tally_for(&mut heuristic, &mut model, experiment.strategy_b.strategy).add(score);
        }
    }

    let experiment_count = completed.len();
    match (heuristic.mean(), model.mean()) {
        (None, None) => AlgorithmRecommendation {
            strategy: RecommendedAlgorithm::Heuristic,
            avg_accuracy: 0.0,
            experiment_count,
            recommendation: "no completed experiments yet; defaulting to the heuristic strategy"
                .to_string(),
        },
        (Some(mean), None) => single_sided(RecommendedAlgorithm::Heuristic, mean, experiment_count),
        (None, Some(mean)) => single_sided(RecommendedAlgorithm::Model, mean, experiment_count),
        (Some(heuristic_mean), Some(model_mean)) => {
            let gap = (heuristic_mean - model_mean).abs();
            if gap < HYBRID_MARGIN {
                AlgorithmRecommendation {
                    strategy: RecommendedAlgorithm::Hybrid,
                    avg_accuracy: (heuristic_mean + model_mean) / 2.0,
                    experiment_count,
                    recommendation: format!(
                        "means within {HYBRID_MARGIN:.0} points (heuristic {heuristic_mean:.1}, model {model_mean:.1}); average both strategies"
                    ),
                }
            } else if heuristic_mean > model_mean {
                leader(
                    RecommendedAlgorithm::Heuristic,
                    heuristic_mean,
                    gap,
                    experiment_count,
                )
            } else {
                leader(RecommendedAlgorithm::Model, model_mean, gap, experiment_count)
            }
        }
    }
}

fn tally_for<'a>(
    heuristic: &'a mut Tally,
    model: &'a mut Tally,
    kind: StrategyKind,
) -> &'a mut Tally {
    match kind {
        StrategyKind::Heuristic => heuristic,
        StrategyKind::Model => model,
    }
}

fn single_sided(
    strategy: RecommendedAlgorithm,
    mean: f64,
    experiment_count: usize,
) -> AlgorithmRecommendation {
    AlgorithmRecommendation {
        strategy,
        avg_accuracy: mean,
        experiment_count,
        recommendation: format!("only {strategy} results so far (mean accuracy {mean:.1})"),
    }
}

fn leader(
    strategy: RecommendedAlgorithm,
    mean: f64,
    gap: f64,
    experiment_count: usize,
) -> AlgorithmRecommendation {
    AlgorithmRecommendation {
        strategy,
        avg_accuracy: mean,
        experiment_count,
        recommendation: format!(
            "{strategy} leads by {gap:.1} points over {experiment_count} completed experiments"
        ),
    }
}

#[derive(Default)]
struct Tally {
    sum: f64,
    count: u32,
}

impl Tally {
    fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}
