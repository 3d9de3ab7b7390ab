//! Plain-text rendering of API payloads.
//!
//! Rendering is a pure function of the JSON it is given: the same payload
//! always produces the same text. Missing or `null` fields render as `N/A`.

use serde_json::Value;

/// Placeholder for absent fields.
pub const MISSING: &str = "N/A";

/// Render `value[key]` for display.
#[must_use]
pub fn field(value: &Value, key: &str) -> String {
    scalar(value.get(key).unwrap_or(&Value::Null))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => MISSING.to_string(),
        Value::String(s) if s.is_empty() => MISSING.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// `Found N <noun>:` followed by one line per item, in the given order.
fn listing(noun: &str, items: &[Value], line: impl Fn(&Value) -> String) -> String {
    let mut out = format!("Found {} {noun}:", items.len());
    if !items.is_empty() {
        out.push_str("\n\n");
        out.push_str(&items.iter().map(line).collect::<Vec<_>>().join("\n"));
    }
    out
}

fn period(sprint: &Value) -> String {
    format!(
        "{} to {}",
        field(sprint, "start_date"),
        field(sprint, "end_date")
    )
}

/// Assignee as an email, falling back to the raw id, or `Unassigned`.
#[must_use]
pub fn assignee(item: &Value) -> String {
    match item.get("assignee") {
        None | Some(Value::Null) => "Unassigned".to_string(),
        Some(person @ Value::Object(_)) => field(person, "email"),
        Some(other) => scalar(other),
    }
}

/// Sprint as a name, falling back to its id, or `Backlog`.
#[must_use]
pub fn sprint_label(item: &Value) -> String {
    match item.get("sprint") {
        None | Some(Value::Null) => "Backlog".to_string(),
        Some(sprint @ Value::Object(_)) => match sprint.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => field(sprint, "id"),
        },
        Some(other) => scalar(other),
    }
}

/// Output of `list_projects`.
#[must_use]
pub fn projects(items: &[Value]) -> String {
    listing("projects", items, |p| {
        format!(
            "- ID {}: {} (status: {})",
            field(p, "id"),
            field(p, "name"),
            field(p, "status")
        )
    })
}

/// Output of `get_project`.
#[must_use]
pub fn project(p: &Value) -> String {
    format!(
        "Project: {}\nID: {}\nStatus: {}\nDescription: {}\nCreated: {}",
        field(p, "name"),
        field(p, "id"),
        field(p, "status"),
        field(p, "description"),
        field(p, "created_at"),
    )
}

/// Output of `list_sprints`.
#[must_use]
pub fn sprints(items: &[Value]) -> String {
    listing("sprints", items, |s| {
        format!(
            "- ID {}: {} (status: {}, {})",
            field(s, "id"),
            field(s, "name"),
            field(s, "status"),
            period(s)
        )
    })
}

/// Output of `get_sprint`.
#[must_use]
pub fn sprint(s: &Value) -> String {
    format!(
        "Sprint: {}\nID: {}\nStatus: {}\nGoal: {}\nPeriod: {}\nVelocity Target: {}",
        field(s, "name"),
        field(s, "id"),
        field(s, "status"),
        field(s, "goal"),
        period(s),
        field(s, "velocity_target"),
    )
}

/// Output of `create_sprint`.
#[must_use]
pub fn sprint_created(s: &Value) -> String {
    format!(
        "Created sprint '{}' (ID: {})\nStatus: {}\nGoal: {}",
        field(s, "name"),
        field(s, "id"),
        field(s, "status"),
        field(s, "goal"),
    )
}

/// Output of `activate_sprint` and `close_sprint`; `verb` is `Activated` or `Closed`.
#[must_use]
pub fn sprint_transitioned(verb: &str, s: &Value) -> String {
    format!(
        "{verb} sprint '{}' (ID: {})\nStatus: {}",
        field(s, "name"),
        field(s, "id"),
        field(s, "status"),
    )
}

/// Output of `list_work_items`.
#[must_use]
pub fn work_items(items: &[Value]) -> String {
    listing("work items", items, |i| {
        format!(
            "- ID {}: {} [{}] (status: {}, priority: {}, points: {})",
            field(i, "id"),
            field(i, "title"),
            field(i, "item_type"),
            field(i, "status"),
            field(i, "priority"),
            field(i, "estimate_points"),
        )
    })
}

/// Output of `get_work_item`.
#[must_use]
pub fn work_item(i: &Value) -> String {
    format!(
        "Work Item: {}\nID: {}\nType: {}\nStatus: {}\nPriority: {}\nEstimate: {} points\nAssignee: {}\nSprint: {}\nDescription: {}",
        field(i, "title"),
        field(i, "id"),
        field(i, "item_type"),
        field(i, "status"),
        field(i, "priority"),
        field(i, "estimate_points"),
        assignee(i),
        sprint_label(i),
        field(i, "description"),
    )
}

/// Output of `create_work_item`.
#[must_use]
pub fn work_item_created(i: &Value) -> String {
    format!(
        "Created {}: {} (ID: {})\nStatus: {}\nPriority: {}",
        field(i, "item_type"),
        field(i, "title"),
        field(i, "id"),
        field(i, "status"),
        field(i, "priority"),
    )
}

/// Output of `update_work_item`.
#[must_use]
pub fn work_item_updated(i: &Value) -> String {
    format!(
        "Updated work item: {} (ID: {})\nStatus: {}\nPriority: {}",
        field(i, "title"),
        field(i, "id"),
        field(i, "status"),
        field(i, "priority"),
    )
}

/// Output of `get_backlog`.
#[must_use]
pub fn backlog(items: &[Value]) -> String {
    listing("backlog items", items, |i| {
        format!(
            "- ID {}: {} [{}] (priority: {}, points: {})",
            field(i, "id"),
            field(i, "title"),
            field(i, "item_type"),
            field(i, "priority"),
            field(i, "estimate_points"),
        )
    })
}
