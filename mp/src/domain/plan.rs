//! ActionPlan domain type
//!
//! The structured result of one generation call. Field names on the wire are
//! camelCase (`weeklyPlan`, `firstSteps`, `suggestedHabits`) because that is
//! the shape the generation service is pinned to.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One day of the weekly roadmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Day label as produced by the service ("Mon", "Monday", "Day 1", ...)
    pub day: String,
    /// Ordered actions for that day
    pub actions: Vec<String>,
}

/// A generated life action plan
///
/// Every field is required. Deserialization fails on a missing or mistyped
/// field, so a partially filled plan never exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    /// Catchy summary of the detected goal
    pub goal: String,
    /// Week-by-day task breakdown
    pub weekly_plan: Vec<DayPlan>,
    /// Very small immediate actions (nominally 3-5)
    pub first_steps: Vec<String>,
    /// Longer-term habits (nominally 2-3)
    pub suggested_habits: Vec<String>,
}

impl ActionPlan {
    /// Total number of actions across the weekly roadmap
    pub fn action_count(&self) -> usize {
        let count = self.weekly_plan.iter().map(|d| d.actions.len()).sum();
        debug!(count, "ActionPlan::action_count: called");
        count
    }

    /// Render the plan as plain markdown-ish text
    pub fn to_text(&self) -> String {
        debug!(goal = %self.goal, "ActionPlan::to_text: called");
        let mut out = format!("# {}\n\n## Weekly Roadmap\n", self.goal);
        for day in &self.weekly_plan {
            out.push_str(&format!("\n### {}\n", day.day));
            for action in &day.actions {
                out.push_str(&format!("- {}\n", action));
            }
        }
        out.push_str("\n## First Steps\n");
        for step in &self.first_steps {
            out.push_str(&format!("- [ ] {}\n", step));
        }
        out.push_str("\n## Suggested Habits\n");
        for habit in &self.suggested_habits {
            out.push_str(&format!("- {}\n", habit));
        }
        out
    }
}
