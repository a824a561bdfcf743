//! Viral coefficient: growth rate scaled by log-compressed reach.

use trendlab_core::model::LifecycleStage;

const VOLUME_BASE: f64 = 1_000.0;

/// `(growth / 100) * log10(volume / 1000)`, rounded to two decimals.
///
/// `None` exactly when the record is DEAD or has no volume. Volumes at or
/// below the 1 000 base produce a log term ≤ 0, so high growth on a tiny
/// sample yields a suppressed or negative coefficient rather than ranking
/// ahead of established trends.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn viral_coefficient(
    growth_percent: f64,
    volume: i64,
    lifecycle: LifecycleStage,
) -> Option<f64> {
    if lifecycle == LifecycleStage::Dead || volume <= 0 {
        return None;
    }
    let reach = (volume as f64 / VOLUME_BASE).log10();
    let raw = (growth_percent / 100.0) * reach;
    Some((raw * 100.0).round() / 100.0)
}
