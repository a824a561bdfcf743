//! Recommended action playbook for a predicted opportunity.

use trendlab_core::model::{LifecycleStage, Urgency};

/// Ordered action list for a trend at `lifecycle` whose window carries
/// `urgency`. The first entry always states the timing expectation; the
/// rest depend on the stage.
#[must_use]
pub fn recommended_actions(lifecycle: LifecycleStage, urgency: Urgency) -> Vec<String> {
    let timing = match urgency {
        Urgency::Critical => "Publish within 24 hours; the window is closing",
        Urgency::High => "Schedule content for the next 48 hours",
        Urgency::Medium => "Draft and review content this week",
        Urgency::Low => "Add to the content backlog and monitor weekly",
    };

    let mut actions = vec![timing.to_string()];
    let stage_actions: &[&str] = match lifecycle {
        LifecycleStage::Emerging => &[
            "Claim the keyword before competitors publish",
            "Test one short-form piece to gauge resonance",
        ],
        LifecycleStage::Growing => &[
            "Scale distribution across owned channels",
            "Commission follow-up pieces in the formats that convert",
        ],
        LifecycleStage::Peak => &[
            "Ride remaining demand with quick-turn updates",
            "Hold long-lead investments until the next cycle",
        ],
        LifecycleStage::Declining | LifecycleStage::Dead => &[
            "Repurpose existing coverage into evergreen material",
            "Shift budget toward earlier-stage trends",
        ],
    };
    actions.extend(stage_actions.iter().map(ToString::to_string));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_combination_yields_ordered_actions() {
        let stages = [
            LifecycleStage::Emerging,
            LifecycleStage::Growing,
            LifecycleStage::Peak,
            LifecycleStage::Declining,
            LifecycleStage::Dead,
        ];
        let urgencies = [
            Urgency::Low,
            Urgency::Medium,
            Urgency::High,
            Urgency::Critical,
        ];
        for stage in stages {
            for urgency in urgencies {
                let actions = recommended_actions(stage, urgency);
                assert!(actions.len() >= 3, "{stage:?}/{urgency:?} too short");
            }
        }
    }

    #[test]
    fn critical_urgency_leads_with_same_day_publishing() {
        let actions = recommended_actions(LifecycleStage::Emerging, Urgency::Critical);
        assert!(actions[0].contains("24 hours"));
        assert!(actions[1].contains("before competitors"));
    }

    #[test]
    fn declining_trends_point_at_repurposing() {
        let actions = recommended_actions(LifecycleStage::Declining, Urgency::Low);
        assert!(actions.iter().any(|a| a.contains("evergreen")));
    }
}
