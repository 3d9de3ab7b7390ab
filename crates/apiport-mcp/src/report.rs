//! Sprint progress reports.

use crate::format::field;
use apiport::domain::{SprintId, WorkItemStatus, WorkItemType};
use serde_json::Value;
use std::fmt;

const RULE_WIDTH: usize = 50;

/// Progress statistics for one sprint.
///
/// Story points only count `user_story` items; task counts include every
/// item in the sprint.
#[derive(Debug, Clone, PartialEq)]
pub struct SprintReport {
    sprint: Value,
    /// Story points of completed user stories.
    pub completed_points: u64,
    /// Story points of all user stories.
    pub total_points: u64,
    /// Items with status `done`.
    pub completed_items: usize,
    /// All items in the sprint.
    pub total_items: usize,
}

impl SprintReport {
    /// Compute the report for `sprint` from a project's work items.
    ///
    /// Items belong to the sprint when their `sprint` field is the sprint id,
    /// either bare or as an object with an `id`.
    #[must_use]
    pub fn compute(sprint_id: SprintId, sprint: Value, items: &[Value]) -> Self {
        let in_sprint: Vec<&Value> = items
            .iter()
            .filter(|item| belongs_to(item, sprint_id))
            .collect();

        let stories: Vec<&Value> = in_sprint
            .iter()
            .copied()
            .filter(|item| item["item_type"] == WorkItemType::UserStory.as_str())
            .collect();

        Self {
            sprint,
            completed_points: stories
                .iter()
                .filter(|i| is_done(i))
                .map(|i| points(i))
                .sum(),
            total_points: stories.iter().map(|i| points(i)).sum(),
            completed_items: in_sprint.iter().filter(|i| is_done(i)).count(),
            total_items: in_sprint.len(),
        }
    }

    /// Completed share of story points in percent; 0 when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        self.completed_points as f64 / self.total_points as f64 * 100.0
    }
}

fn belongs_to(item: &Value, sprint_id: SprintId) -> bool {
    let id = match item.get("sprint") {
        Some(Value::Object(sprint)) => sprint.get("id").and_then(Value::as_u64),
        Some(other) => other.as_u64(),
        None => None,
    };
    id == Some(sprint_id.get())
}

fn is_done(item: &Value) -> bool {
    item["status"] == WorkItemStatus::Done.as_str()
}

fn points(item: &Value) -> u64 {
    item.get("estimate_points")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

impl fmt::Display for SprintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.sprint;
        writeln!(f, "Sprint Report: {}", field(s, "name"))?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "Sprint ID: {}", field(s, "id"))?;
        writeln!(f, "Status: {}", field(s, "status"))?;
        writeln!(f, "Goal: {}", field(s, "goal"))?;
        writeln!(
            f,
            "Period: {} to {}",
            field(s, "start_date"),
            field(s, "end_date")
        )?;
        writeln!(f)?;
        writeln!(f, "Story Points:")?;
        writeln!(f, "  Completed: {}", self.completed_points)?;
        writeln!(f, "  Total: {}", self.total_points)?;
        writeln!(f, "  Progress: {:.1}%", self.progress())?;
        writeln!(f)?;
        writeln!(f, "Tasks:")?;
        writeln!(f, "  Completed: {}", self.completed_items)?;
        writeln!(f, "  Total: {}", self.total_items)?;
        writeln!(f)?;
        writeln!(f, "Velocity:")?;
        writeln!(f, "  Target: {}", field(s, "velocity_target"))?;
        write!(f, "  Actual: {}", self.completed_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sprint_id() -> SprintId {
        SprintId::new(4).unwrap()
    }

    fn items() -> Vec<Value> {
        vec![
            json!({"id": 1, "item_type": "user_story", "status": "done", "estimate_points": 5, "sprint": 4}),
            json!({"id": 2, "item_type": "user_story", "status": "in_progress", "estimate_points": 3, "sprint": {"id": 4, "name": "S4"}}),
            json!({"id": 3, "item_type": "task", "status": "done", "estimate_points": 8, "sprint": 4}),
            json!({"id": 4, "item_type": "user_story", "status": "done", "estimate_points": 13, "sprint": 5}),
            json!({"id": 5, "item_type": "bug", "status": "todo", "sprint": null}),
            json!({"id": 6, "item_type": "user_story", "status": "todo", "sprint": 4}),
        ]
    }

    #[test]
    fn test_counts_only_items_in_sprint() {
        let report = SprintReport::compute(sprint_id(), json!({"id": 4}), &items());
        assert_eq!(report.total_items, 4);
        assert_eq!(report.completed_items, 2);
    }

    #[test]
    fn test_points_only_from_user_stories() {
        let report = SprintReport::compute(sprint_id(), json!({"id": 4}), &items());
        assert_eq!(report.total_points, 8);
        assert_eq!(report.completed_points, 5);
        assert!((report.progress() - 62.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_sprint_has_zero_progress() {
        let report = SprintReport::compute(sprint_id(), json!({"id": 4}), &[]);
        assert_eq!(report.total_items, 0);
        assert!(report.progress().abs() < f64::EPSILON);
        assert!(report.to_string().contains("Progress: 0.0%"));
    }

    #[test]
    fn test_rendered_report() {
        let sprint = json!({
            "id": 4,
            "name": "Sprint 4",
            "status": "active",
            "goal": "Ship login",
            "start_date": "2025-03-03",
            "end_date": "2025-03-14",
            "velocity_target": 10,
        });
        let report = SprintReport::compute(sprint_id(), sprint, &items());
        let expected = format!(
            "Sprint Report: Sprint 4\n{}\nSprint ID: 4\nStatus: active\nGoal: Ship login\n\
             Period: 2025-03-03 to 2025-03-14\n\nStory Points:\n  Completed: 5\n  Total: 8\n\
             \x20 Progress: 62.5%\n\nTasks:\n  Completed: 2\n  Total: 4\n\nVelocity:\n\
             \x20 Target: 10\n  Actual: 5",
            "=".repeat(50)
        );
        assert_eq!(report.to_string(), expected);
    }
}
