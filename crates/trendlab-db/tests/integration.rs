//! Offline unit tests for trendlab-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use trendlab_core::model::{ExperimentStatus, LifecycleStage, StrategyKind};
use trendlab_core::{AppConfig, Environment};
use trendlab_db::{AlgorithmExperimentRow, PoolConfig, TrendRecordRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        context_path: PathBuf::from("./config/business.yaml"),
        model_base_url: None,
        model_api_key: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        model_request_timeout_secs: 20,
        model_max_retries: 2,
        model_retry_backoff_base_ms: 500,
        scorer_timeout_secs: 10,
        forecast_timeout_secs: 20,
        collect_max_concurrent: 4,
        predict_max_concurrent: 4,
        active_trend_limit: 100,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn sample_trend_row() -> TrendRecordRow {
    let captured = Utc::now();
    TrendRecordRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        source: "search-trends".to_string(),
        keyword: "Cold Brew".to_string(),
        keyword_norm: "cold brew".to_string(),
        capture_bucket: captured.date_naive(),
        volume: 12_000,
        growth_percent: 80.0,
        competition: 40.0,
        geo_level: "country".to_string(),
        geo_location: "US".to_string(),
        lifecycle: "growing".to_string(),
        viral_coefficient: Some(0.86),
        sentiment: 0.4,
        relevance_score: 72,
        pillars: vec!["coffee-culture".to_string()],
        related_keywords: vec!["nitro cold brew".to_string()],
        top_content: json!([{"url": "https://example.com/a", "title": "Cold brew at home"}]),
        peak_prediction: None,
        opportunity_window: None,
        captured_at: captured,
        expires_at: captured + Duration::days(7),
        created_at: captured,
        updated_at: captured,
    }
}

/// Compile-time smoke test: confirm that [`TrendRecordRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn trend_record_row_has_expected_fields() {
    let row = sample_trend_row();

    assert_eq!(row.id, 1);
    assert_eq!(row.source, "search-trends");
    assert_eq!(row.keyword_norm, "cold brew");
    assert_eq!(row.lifecycle, "growing");
    assert_eq!(row.relevance_score, 72);
    assert!(row.peak_prediction.is_none());
}

#[test]
fn trend_record_row_converts_to_domain_record() {
    let row = sample_trend_row();
    let public_id = row.public_id;

    let record = row.into_record().expect("row should convert");

    assert_eq!(record.id, public_id);
    assert_eq!(record.lifecycle, LifecycleStage::Growing);
    assert_eq!(record.geography.location, "US");
    assert_eq!(record.top_content.len(), 1);
    assert_eq!(record.top_content[0].url, "https://example.com/a");
    assert!(record.peak_prediction.is_none());
}

#[test]
fn trend_record_row_parses_stored_prediction() {
    let mut row = sample_trend_row();
    row.peak_prediction = Some(json!({
        "predicted_peak_at": "2026-08-20T00:00:00Z",
        "days_until_peak": 3,
        "confidence": 70,
        "strategy": "heuristic",
        "reasoning": "emerging trend with strong momentum"
    }));
    row.opportunity_window = Some(json!({
        "start": "2026-08-15T00:00:00Z",
        "end": "2026-08-21T00:00:00Z",
        "days_remaining": 4,
        "urgency": "high"
    }));

    let record = row.into_record().expect("row should convert");

    let peak = record.peak_prediction.expect("peak present");
    assert_eq!(peak.days_until_peak, 3);
    assert_eq!(peak.strategy, StrategyKind::Heuristic);
    let window = record.opportunity_window.expect("window present");
    assert_eq!(window.days_remaining, 4);
}

#[test]
fn trend_record_row_rejects_unknown_lifecycle() {
    let mut row = sample_trend_row();
    row.lifecycle = "plateau".to_string();

    let result = row.into_record();
    assert!(
        matches!(result, Err(trendlab_db::DbError::Decode { column: "lifecycle", .. })),
        "expected Decode(lifecycle), got: {result:?}"
    );
}

/// Compile-time smoke test: confirm that [`AlgorithmExperimentRow`] has all
/// expected fields with the correct types. No database required.
#[test]
fn experiment_row_has_expected_fields() {
    let row = AlgorithmExperimentRow {
        id: 9_i64,
        public_id: Uuid::new_v4(),
        trend_public_id: Uuid::new_v4(),
        subject_keyword: "cold brew".to_string(),
        strategy_a: json!({"strategy": "heuristic", "days_until_peak": 5, "confidence": 65, "reasoning": "growing"}),
        strategy_b: json!({"strategy": "model", "days_until_peak": 8, "confidence": 72, "reasoning": "model output"}),
        status: "running".to_string(),
        control_performance: None,
        variant_performance: None,
        improvement: None,
        is_significant: None,
        recommendation: None,
        started_at: Utc::now(),
        completed_at: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 9);
    assert_eq!(row.status, "running");
    assert!(row.completed_at.is_none());
}

#[test]
fn experiment_row_converts_to_domain_experiment() {
    let row = AlgorithmExperimentRow {
        id: 9_i64,
        public_id: Uuid::new_v4(),
        trend_public_id: Uuid::new_v4(),
        subject_keyword: "cold brew".to_string(),
        strategy_a: json!({"strategy": "heuristic", "days_until_peak": 5, "confidence": 65, "reasoning": "growing"}),
        strategy_b: json!({"strategy": "model", "days_until_peak": 8, "confidence": 72, "reasoning": "model output"}),
        status: "completed".to_string(),
        control_performance: Some(82.0),
        variant_performance: Some(65.0),
        improvement: Some(17.0),
        is_significant: Some(true),
        recommendation: Some("heuristic wins".to_string()),
        started_at: Utc::now(),
        completed_at: Some(Utc::now()),
        created_at: Utc::now(),
    };

    let experiment = row.into_experiment().expect("row should convert");

    assert_eq!(experiment.status, ExperimentStatus::Completed);
    assert_eq!(experiment.strategy_a.strategy, StrategyKind::Heuristic);
    assert_eq!(experiment.strategy_a.days_until_peak, 5);
    assert_eq!(experiment.strategy_b.strategy, StrategyKind::Model);
    assert_eq!(experiment.control_performance, Some(82.0));
    assert_eq!(experiment.is_significant, Some(true));
}
