//! Experiment command handlers for the CLI.
//!
//! `run` and `complete` drive the one-way experiment lifecycle; `best`
//! is a read-only aggregate over recent completed experiments.

use chrono::NaiveDate;
use clap::Subcommand;
use uuid::Uuid;

use trendlab_engine::TrendEngine;

/// Sub-commands available under `experiment`.
#[derive(Debug, Subcommand)]
pub enum ExperimentCommands {
    /// Run both prediction strategies side by side on one trend
    Run {
        /// Trend id to experiment on
        #[arg(long)]
        trend: Uuid,
    },
    /// Score a running experiment against the observed peak date
    Complete {
        /// Experiment id
        #[arg(long)]
        experiment: Uuid,
        /// Observed peak date, e.g. 2026-08-20
        #[arg(long)]
        peak_date: NaiveDate,
    },
    /// Recommend a strategy from recent completed experiments
    Best,
}

/// Start a side-by-side strategy comparison and print both forecasts.
///
/// # Errors
///
/// Returns an error if the trend does not exist or the experiment cannot
/// be recorded.
pub(crate) async fn run_experiment_start(
    engine: &TrendEngine,
    trend_id: Uuid,
) -> anyhow::Result<()> {
    let experiment = engine.run_experiment(trend_id).await?;

    println!(
        "experiment {} started for '{}'",
        experiment.id, experiment.subject_keyword
    );
    for snapshot in [&experiment.strategy_a, &experiment.strategy_b] {
        println!(
            "  {}: peak in {} days at confidence {}",
            snapshot.strategy, snapshot.days_until_peak, snapshot.confidence
        );
    }
    println!(
        "complete it once the peak is observed: experiment complete --experiment {} --peak-date <date>",
        experiment.id
    );

    Ok(())
}

/// Complete a running experiment and print the scored outcome.
///
/// The observed peak date is taken at midnight UTC; experiments run on
/// whole days, so the time of day never changes the score.
///
/// # Errors
///
/// Returns an error if the experiment does not exist or was already
/// completed.
pub(crate) async fn run_experiment_complete(
    engine: &TrendEngine,
    experiment_id: Uuid,
    peak_date: NaiveDate,
) -> anyhow::Result<()> {
    let actual_peak_at = peak_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid peak date '{peak_date}'"))?
        .and_utc();

    let outcome = engine.complete_experiment(experiment_id, actual_peak_at).await?;

    println!("experiment {experiment_id} completed");
    println!("  control accuracy: {:.1}", outcome.control_performance);
    println!("  variant accuracy: {:.1}", outcome.variant_performance);
    let significance = if outcome.is_significant {
        "significant"
    } else {
        "not significant"
    };
    println!(
        "  improvement: {:.1} points ({significance})",
        outcome.improvement
    );
    println!("  verdict: {}", outcome.recommendation);

    Ok(())
}

/// Print the aggregate strategy recommendation.
///
/// # Errors
///
/// Returns an error if the completed experiments cannot be listed.
pub(crate) async fn run_experiment_best(engine: &TrendEngine) -> anyhow::Result<()> {
    let verdict = engine.best_algorithm().await?;

    println!("recommended strategy: {}", verdict.strategy);
    println!(
        "  mean accuracy {:.1} over {} completed experiments",
        verdict.avg_accuracy, verdict.experiment_count
    );
    println!("  {}", verdict.recommendation);

    Ok(())
}
