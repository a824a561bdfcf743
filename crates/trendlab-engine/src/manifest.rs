//! Operation-to-use-case manifest.
//!
//! Maps every engine operation to the business use-case identifier it
//! serves. A plain compile-time table with a lookup helper; nothing here
//! carries runtime behavior beyond the lookup itself.

pub const USE_CASES: &[(&str, &str)] = &[
    ("collect_and_score", "UC-TREND-001"),
    ("predict_peak", "UC-TREND-002"),
    ("predict_all_active", "UC-TREND-003"),
    ("urgent_opportunities", "UC-TREND-004"),
    ("early_signals", "UC-TREND-005"),
    ("purge_expired", "UC-TREND-006"),
    ("run_experiment", "UC-EXPERIMENT-001"),
    ("complete_experiment", "UC-EXPERIMENT-002"),
    ("best_algorithm", "UC-EXPERIMENT-003"),
];

/// Use-case identifier for an operation name, if the operation exists.
#[must_use]
pub fn use_case(operation: &str) -> Option<&'static str> {
    USE_CASES
        .iter()
        .find(|(name, _)| *name == operation)
        .map(|(_, id)| *id)
}
