//! Lifecycle staging from a single observation's growth and volume.

use trendlab_core::model::LifecycleStage;

const BREAKOUT_GROWTH: f64 = 200.0;
const BREAKOUT_VOLUME_CEILING: i64 = 10_000;
const GROWING_GROWTH_FLOOR: f64 = 50.0;
const PEAK_GROWTH_FLOOR: f64 = -10.0;
const PEAK_VOLUME_FLOOR: i64 = 50_000;
const DECLINE_GROWTH_CEILING: f64 = -10.0;

/// Stages a trend from one observation.
///
/// Ordered rules, first match wins. The fallback stage is EMERGING, which
/// also catches explosive growth at volumes too large for the breakout rule
/// and quiet mid-growth keywords that match nothing else. Never yields DEAD:
/// a keyword that stops being observed ages out through record expiry
/// instead of being staged dead here.
#[must_use]
pub fn classify(growth_percent: f64, volume: i64) -> LifecycleStage {
    if growth_percent > BREAKOUT_GROWTH && volume < BREAKOUT_VOLUME_CEILING {
        LifecycleStage::Emerging
    } else if growth_percent > GROWING_GROWTH_FLOOR && growth_percent <= BREAKOUT_GROWTH {
        LifecycleStage::Growing
    } else if growth_percent > PEAK_GROWTH_FLOOR
        && growth_percent <= GROWING_GROWTH_FLOOR
        && volume > PEAK_VOLUME_FLOOR
    {
        LifecycleStage::Peak
    } else if growth_percent <= DECLINE_GROWTH_CEILING {
        LifecycleStage::Declining
    } else {
        LifecycleStage::Emerging
    }
}
