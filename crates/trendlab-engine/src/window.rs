//! Opportunity window and urgency around a predicted peak.

use chrono::{DateTime, Duration, Utc};
use trendlab_core::model::{OpportunityWindow, Urgency};

/// Days before the predicted peak when the window opens.
pub const WINDOW_LEAD_DAYS: i64 = 5;
/// Days after the predicted peak when the window closes.
pub const WINDOW_TRAIL_DAYS: i64 = 1;
/// Velocity above which urgency is escalated one level.
pub const ESCALATION_VELOCITY: f64 = 20.0;

/// An urgency level together with whether the velocity escalation has
/// already been applied. Escalating an escalated rating is a no-op, which
/// makes the bump idempotent no matter how many pipeline layers apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyRating {
    level: Urgency,
    escalated: bool,
}

impl UrgencyRating {
    /// Base rating from how many whole days remain before the window closes.
    #[must_use]
    pub fn from_days_remaining(days_remaining: i64) -> Self {
        let level = match days_remaining {
            d if d <= 1 => Urgency::Critical,
            d if d <= 3 => Urgency::High,
            d if d <= 5 => Urgency::Medium,
            _ => Urgency::Low,
        };
        Self {
            level,
            escalated: false,
        }
    }

    /// Bumps the level once when velocity clears [`ESCALATION_VELOCITY`],
    /// capped at CRITICAL.
    #[must_use]
    pub fn escalate(self, velocity: f64) -> Self {
        if self.escalated || velocity <= ESCALATION_VELOCITY {
            return self;
        }
        Self {
            level: self.level.bumped(),
            escalated: true,
        }
    }

    #[must_use]
    pub fn level(self) -> Urgency {
        self.level
    }
}

/// Builds the actionable window around a predicted peak: five days of lead
/// time, one day of trailing interest, urgency from the remaining days with
/// the velocity escalation applied.
#[must_use]
pub fn opportunity_window(
    predicted_peak_at: DateTime<Utc>,
    velocity: f64,
    now: DateTime<Utc>,
) -> OpportunityWindow {
    let start = predicted_peak_at - Duration::days(WINDOW_LEAD_DAYS);
    let end = predicted_peak_at + Duration::days(WINDOW_TRAIL_DAYS);
    let days_remaining = (end - now).num_days().max(0);
    let urgency = UrgencyRating::from_days_remaining(days_remaining)
        .escalate(velocity)
        .level();
    OpportunityWindow {
        start,
        end,
        days_remaining,
        urgency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn urgency_ladder_matches_remaining_days() {
        assert_eq!(UrgencyRating::from_days_remaining(0).level(), Urgency::Critical);
        assert_eq!(UrgencyRating::from_days_remaining(1).level(), Urgency::Critical);
        assert_eq!(UrgencyRating::from_days_remaining(2).level(), Urgency::High);
        assert_eq!(UrgencyRating::from_days_remaining(3).level(), Urgency::High);
        assert_eq!(UrgencyRating::from_days_remaining(4).level(), Urgency::Medium);
        assert_eq!(UrgencyRating::from_days_remaining(5).level(), Urgency::Medium);
        assert_eq!(UrgencyRating::from_days_remaining(6).level(), Urgency::Low);
        assert_eq!(UrgencyRating::from_days_remaining(30).level(), Urgency::Low);
    }

    #[test]
    fn urgency_never_decreases_as_days_shrink() {
        for velocity in [0.0, 25.0] {
            let mut last = Urgency::Low;
            for days in (0..=10).rev() {
                let level = UrgencyRating::from_days_remaining(days)
                    .escalate(velocity)
                    .level();
                assert!(level >= last, "urgency dropped at {days} days");
                last = level;
            }
        }
    }

    #[test]
    fn high_velocity_escalates_one_level() {
        let rating = UrgencyRating::from_days_remaining(6).escalate(25.0);
        assert_eq!(rating.level(), Urgency::Medium);
        let rating = UrgencyRating::from_days_remaining(4).escalate(25.0);
        assert_eq!(rating.level(), Urgency::High);
        let rating = UrgencyRating::from_days_remaining(2).escalate(25.0);
        assert_eq!(rating.level(), Urgency::Critical);
    }

    #[test]
    fn escalation_caps_at_critical() {
        let rating = UrgencyRating::from_days_remaining(0).escalate(100.0);
        assert_eq!(rating.level(), Urgency::Critical);
    }

    #[test]
    fn escalation_is_idempotent() {
        let once = UrgencyRating::from_days_remaining(4).escalate(25.0);
        let twice = once.escalate(25.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn velocity_at_threshold_does_not_escalate() {
        let rating = UrgencyRating::from_days_remaining(6).escalate(20.0);
        assert_eq!(rating.level(), Urgency::Low);
    }

    #[test]
    fn window_brackets_the_predicted_peak() {
        let peak = now() + Duration::days(3);
        let window = opportunity_window(peak, 0.0, now());
        assert_eq!(window.start, peak - Duration::days(5));
        assert_eq!(window.end, peak + Duration::days(1));
        assert_eq!(window.days_remaining, 4);
        assert_eq!(window.urgency, Urgency::Medium);
    }

    #[test]
    fn remaining_days_floor_and_never_go_negative() {
        let peak = now() - Duration::days(10);
        let window = opportunity_window(peak, 0.0, now());
        assert_eq!(window.days_remaining, 0);
        assert_eq!(window.urgency, Urgency::Critical);

        let peak = now() + Duration::hours(30);
        let window = opportunity_window(peak, 0.0, now());
        // 30h to peak + 24h trail = 2.25 days, floored to 2.
        assert_eq!(window.days_remaining, 2);
        assert_eq!(window.urgency, Urgency::High);
    }

    #[test]
    fn window_urgency_reflects_escalation() {
        let peak = now() + Duration::days(9);
        let calm = opportunity_window(peak, 5.0, now());
        assert_eq!(calm.urgency, Urgency::Low);
        let hot = opportunity_window(peak, 25.0, now());
        assert_eq!(hot.urgency, Urgency::Medium);
    }
}
