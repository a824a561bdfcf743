//! Trend intelligence engine.
//!
//! Turns raw per-source signal samples into relevance-filtered,
//! lifecycle-staged trend records, estimates growth dynamics, predicts peak
//! timing through two interchangeable strategies with transparent fallback,
//! derives opportunity windows with urgency, and tracks which strategy
//! performs better over time. Everything external (signal sources, scoring,
//! forecasting, persistence) comes in through the ports defined in
//! `trendlab-core`.

pub mod actions;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod lifecycle;
pub mod manifest;
pub mod predictor;
pub mod relevance;
pub mod velocity;
pub mod viral;
pub mod window;

pub use engine::{
    CollectFailure, CollectSummary, EngineConfig, PredictFailure, PredictionBatch, TrendEngine,
};
pub use error::EngineError;
