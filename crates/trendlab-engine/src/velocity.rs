//! Growth velocity and acceleration from a keyword's capture history.

use chrono::{DateTime, Utc};
use trendlab_core::model::TrendRecord;

/// Points needed before velocity is estimated rather than defaulted to 0.
pub const MIN_POINTS_FOR_VELOCITY: usize = 2;
/// Points needed before acceleration is estimated rather than defaulted to 0.
pub const MIN_POINTS_FOR_ACCELERATION: usize = 3;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One (capture time, growth) sample. The estimator expects series sorted
/// ascending by `captured_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPoint {
    pub captured_at: DateTime<Utc>,
    pub growth_percent: f64,
}

impl From<&TrendRecord> for GrowthPoint {
    fn from(record: &TrendRecord) -> Self {
        Self {
            captured_at: record.captured_at,
            growth_percent: record.growth_percent,
        }
    }
}

/// Growth change per day and its own rate of change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityEstimate {
    pub velocity: f64,
    pub acceleration: f64,
}

impl VelocityEstimate {
    pub const ZERO: VelocityEstimate = VelocityEstimate {
        velocity: 0.0,
        acceleration: 0.0,
    };
}

/// Estimates velocity from the two most recent points and acceleration as
/// the first difference of the last two pairwise velocities.
///
/// Short histories are not an error: fewer than 2 points gives zero
/// velocity, fewer than 3 gives zero acceleration.
#[must_use]
pub fn estimate(series: &[GrowthPoint]) -> VelocityEstimate {
    if series.len() < MIN_POINTS_FOR_VELOCITY {
        return VelocityEstimate::ZERO;
    }
    let n = series.len();
    let velocity = pairwise_velocity(&series[n - 2], &series[n - 1]);
    if series.len() < MIN_POINTS_FOR_ACCELERATION {
        return VelocityEstimate {
            velocity,
            acceleration: 0.0,
        };
    }
    let previous = pairwise_velocity(&series[n - 3], &series[n - 2]);
    VelocityEstimate {
        velocity,
        acceleration: velocity - previous,
    }
}

// Elapsed days under one are floored to one so same-day duplicate captures
// cannot blow the quotient up.
#[allow(clippy::cast_precision_loss)]
fn pairwise_velocity(earlier: &GrowthPoint, later: &GrowthPoint) -> f64 {
    let elapsed_days = (later.captured_at - earlier.captured_at).num_seconds() as f64
        / SECONDS_PER_DAY;
    (later.growth_percent - earlier.growth_percent) / elapsed_days.max(1.0)
}
