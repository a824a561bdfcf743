//! Trend command handlers for the CLI.
//!
//! These are called from `main` after the database pool and engine are
//! established. Collection and batch prediction tolerate partial failure;
//! anything that failed is printed to stderr without aborting the run.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use trendlab_core::model::TrendPrediction;
use trendlab_core::ports::{FetchParams, SignalSource};
use trendlab_engine::TrendEngine;

use crate::sources::FileSource;

/// Collect signals from the given JSON exports and persist the relevant ones.
///
/// # Errors
///
/// Returns an error if no export files were given. Per-source and per-signal
/// failures are reported on stderr, not propagated; the run only exits
/// nonzero when every source failed.
pub(crate) async fn run_collect(
    engine: &TrendEngine,
    files: &[PathBuf],
    seed_keywords: Vec<String>,
    limit: usize,
) -> anyhow::Result<()> {
    if files.is_empty() {
        anyhow::bail!("no signal exports given; pass at least one --file");
    }

    let file_sources: Vec<Arc<FileSource>> = files
        .iter()
        .map(|path| Arc::new(FileSource::new(path)))
        .collect();
    let sources: Vec<Arc<dyn SignalSource>> = file_sources
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn SignalSource>)
        .collect();

    let params = FetchParams {
        seed_keywords,
        limit,
        ..FetchParams::default()
    };
    let summary = engine.collect_and_score(&sources, &params).await;

    for failure in &summary.errors {
        match &failure.keyword {
            Some(keyword) => eprintln!(
                "error: [{}] failed to store '{}': {}",
                failure.source, keyword, failure.message
            ),
            None => eprintln!("error: [{}] fetch failed: {}", failure.source, failure.message),
        }
    }

    println!(
        "stored {} of {} signals across {} sources",
        summary.stored,
        summary.collected,
        sources.len()
    );
    for (source, stored) in &summary.by_source {
        println!("  {source}: {stored}");
    }
    for source in &file_sources {
        let snap = source.usage.snapshot();
        tracing::debug!(
            source = %snap.source,
            requests = snap.requests,
            signals = snap.signals,
            failures = snap.failures,
            "source usage"
        );
    }

    let fetch_failures = summary.errors.iter().filter(|e| e.keyword.is_none()).count();
    if fetch_failures == sources.len() {
        anyhow::bail!("all {fetch_failures} sources failed to fetch");
    }

    Ok(())
}

/// Predict the peak for a single trend and print the full forecast.
///
/// # Errors
///
/// Returns an error if the trend does not exist (or has expired) or the
/// prediction cannot be persisted.
pub(crate) async fn run_predict_one(
    engine: &TrendEngine,
    trend_id: Uuid,
    as_json: bool,
) -> anyhow::Result<()> {
    let prediction = engine.predict_peak(trend_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    println!(
        "{} peaks in {} days ({})",
        prediction.keyword,
        prediction.days_until_peak,
        prediction.predicted_peak_at.format("%Y-%m-%d")
    );
    println!(
        "confidence {} | strategy {} | velocity {:+.1}/day | acceleration {:+.1}",
        prediction.confidence, prediction.strategy, prediction.velocity, prediction.acceleration
    );
    println!(
        "window {} to {} ({} days remaining, {} urgency)",
        prediction.window.start.format("%Y-%m-%d"),
        prediction.window.end.format("%Y-%m-%d"),
        prediction.window.days_remaining,
        prediction.window.urgency
    );
    println!("reasoning: {}", prediction.reasoning);
    for action in &prediction.recommended_actions {
        println!("  - {action}");
    }

    Ok(())
}

/// Predict peaks for every active trend and print them nearest first.
///
/// # Errors
///
/// Returns an error if the active trends cannot be listed. Per-trend
/// prediction failures are reported on stderr, not propagated.
pub(crate) async fn run_predict_all(engine: &TrendEngine, as_json: bool) -> anyhow::Result<()> {
    let batch = engine.predict_all_active().await?;

    for failure in &batch.errors {
        eprintln!(
            "error: prediction failed for '{}' ({}): {}",
            failure.keyword, failure.trend_id, failure.message
        );
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&batch.predictions)?);
        return Ok(());
    }

    if batch.predictions.is_empty() {
        println!("no active trends to predict; run `collect` first");
        return Ok(());
    }

    print_prediction_table(&batch.predictions);
    Ok(())
}

/// List trends whose opportunity window is closing, most urgent first.
///
/// # Errors
///
/// Returns an error if the active trends cannot be listed.
pub(crate) async fn run_opportunities(engine: &TrendEngine) -> anyhow::Result<()> {
    let urgent = engine.urgent_opportunities().await?;

    if urgent.is_empty() {
        println!("no urgent opportunities right now");
        return Ok(());
    }

    print_prediction_table(&urgent);
    Ok(())
}

/// List trends peaking far enough out to prepare content for.
///
/// # Errors
///
/// Returns an error if the active trends cannot be listed.
pub(crate) async fn run_early_signals(engine: &TrendEngine) -> anyhow::Result<()> {
    let early = engine.early_signals().await?;

    if early.is_empty() {
        println!("no early signals in the 7-14 day band");
        return Ok(());
    }

    print_prediction_table(&early);
    Ok(())
}

/// Delete trend records past their retention horizon.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub(crate) async fn run_purge(engine: &TrendEngine) -> anyhow::Result<()> {
    let purged = engine.purge_expired().await?;
    println!("purged {purged} expired trend records");
    Ok(())
}

fn print_prediction_table(predictions: &[TrendPrediction]) {
    let header = format!(
        "{:<28}{:<10}{:<6}{:<10}{:<9}STRATEGY",
        "KEYWORD", "PEAK IN", "CONF", "URGENCY", "CLOSES"
    );
    println!("{header}");
    for prediction in predictions {
        let keyword_display = if prediction.keyword.chars().count() > 26 {
            format!("{}...", prediction.keyword.chars().take(23).collect::<String>())
        } else {
            prediction.keyword.clone()
        };
        println!(
            "{:<28}{:<10}{:<6}{:<10}{:<9}{}",
            keyword_display,
            format!("{}d", prediction.days_until_peak),
            prediction.confidence,
            prediction.window.urgency.to_string(),
            format!("{}d", prediction.window.days_remaining),
            prediction.strategy
        );
    }
}
