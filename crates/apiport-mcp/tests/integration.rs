//! Integration tests for apiport-mcp.
//!
//! These tests drive the tools through [`ToolRequest::parse`] against an
//! in-memory tracker to verify end-to-end behavior including:
//! - Argument validation before any tracker call
//! - Sprint lifecycle (create -> activate -> close)
//! - Sprint reports over real work item data
//! - Error rendering and resource reads

use apiport::{Config, Tracker};
use apiport::mock::MockTracker;
use apiport_mcp::context::Context;
use apiport_mcp::error::Error;
use apiport_mcp::request::ToolRequest;
use apiport_mcp::resources::ResourceUri;
use apiport_mcp::tools::Tools;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

mod helpers {
    use super::*;

    /// A tracker with one project, one planned sprint and a small backlog.
    pub fn seeded_tracker() -> Arc<MockTracker> {
        Arc::new(
            MockTracker::new()
                .with_project(1, "Alpha")
                .with_sprint(10, 1, "Sprint 10", "planned")
                .with_work_item(
                    20,
                    1,
                    json!({"title": "Login page", "item_type": "user_story", "status": "done",
                           "priority": 2, "estimate_points": 5, "sprint": 10}),
                )
                .with_work_item(
                    21,
                    1,
                    json!({"title": "Signup page", "item_type": "user_story", "status": "todo",
                           "priority": 3, "estimate_points": 3, "sprint": null}),
                )
                .with_work_item(
                    22,
                    1,
                    json!({"title": "Set up CI", "item_type": "task", "status": "todo",
                           "priority": 4, "sprint": null}),
                ),
        )
    }

    pub fn tools(tracker: &Arc<MockTracker>) -> Tools {
        let shared: Arc<dyn Tracker> = tracker.clone();
        Tools::new(Arc::new(Context::with_tracker(Config::default(), shared)))
    }

    pub async fn run(tools: &Tools, name: &str, arguments: Value) -> Result<String, Error> {
        let request = ToolRequest::parse(name, arguments)?;
        tools.execute(request).await
    }
}

use helpers::{run, seeded_tracker, tools};

// =============================================================================
// Validation
// =============================================================================

#[rstest]
#[case::zero_id("get_project", json!({"project_id": 0}))]
#[case::missing_id("get_sprint", json!({}))]
#[case::blank_name("create_sprint", json!({"project_id": 1, "name": "  "}))]
#[case::bad_date("create_sprint", json!({"project_id": 1, "name": "S", "start_date": "03/03/2025"}))]
#[case::reversed_dates("create_sprint", json!({"project_id": 1, "name": "S", "start_date": "2025-03-14", "end_date": "2025-03-03"}))]
#[case::priority_out_of_range("create_work_item", json!({"project_id": 1, "title": "T", "priority": 9}))]
#[case::unknown_type("create_work_item", json!({"project_id": 1, "title": "T", "item_type": "feature"}))]
#[case::empty_update("update_work_item", json!({"work_item_id": 20}))]
#[case::unknown_status("update_work_item", json!({"work_item_id": 20, "status": "finished"}))]
#[case::empty_bulk("bulk_assign_to_sprint", json!({"sprint_id": 10, "work_item_ids": []}))]
#[tokio::test]
async fn test_invalid_arguments_never_reach_tracker(#[case] name: &str, #[case] arguments: Value) {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);

    let err = run(&tools, name, arguments).await.unwrap_err();

    assert!(matches!(
        err.api_error(),
        Some(apiport::Error::Validation { .. })
    ));
    assert!(err.to_string().starts_with(name));
    assert_eq!(tracker.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_tool() {
    let tools = tools(&seeded_tracker());
    let err = run(&tools, "delete_project", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::UnknownTool(ref name) if name == "delete_project"));
}

// =============================================================================
// Tool flows
// =============================================================================

#[tokio::test]
async fn test_not_found_names_operation_and_status() {
    let tools = tools(&seeded_tracker());
    let err = run(&tools, "get_project", json!({"project_id": 999}))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("get_project 999: "));
    assert!(message.contains("404"));
}

#[tokio::test]
async fn test_sprint_lifecycle() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);

    let created = run(
        &tools,
        "create_sprint",
        json!({"project_id": 1, "name": "Sprint 11", "goal": "Ship signup",
               "start_date": "2025-03-17", "end_date": "2025-03-28", "velocity_target": 8}),
    )
    .await
    .unwrap();
    assert!(created.starts_with("Created sprint 'Sprint 11' (ID: 23)"));

    let shown = run(&tools, "get_sprint", json!({"sprint_id": 23}))
        .await
        .unwrap();
    assert!(shown.contains("Goal: Ship signup"));
    assert!(shown.contains("Period: 2025-03-17 to 2025-03-28"));

    let activated = run(&tools, "activate_sprint", json!({"sprint_id": 23}))
        .await
        .unwrap();
    assert!(activated.starts_with("Activated sprint 'Sprint 11'"));
    assert!(activated.ends_with("Status: active"));

    let closed = run(&tools, "close_sprint", json!({"sprint_id": 23}))
        .await
        .unwrap();
    assert!(closed.ends_with("Status: closed"));

    let err = run(&tools, "close_sprint", json!({"sprint_id": 23}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn test_backlog_shrinks_after_bulk_assign() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);

    let backlog = run(&tools, "get_backlog", json!({"project_id": 1}))
        .await
        .unwrap();
    assert!(backlog.starts_with("Found 2 backlog items:"));

    let assigned = run(
        &tools,
        "bulk_assign_to_sprint",
        json!({"sprint_id": 10, "work_item_ids": [21, 22, 21]}),
    )
    .await
    .unwrap();
    assert_eq!(assigned, "Assigned 2 items to sprint 10");

    let backlog = run(&tools, "get_backlog", json!({"project_id": 1}))
        .await
        .unwrap();
    assert_eq!(backlog, "Found 0 backlog items:");
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);

    let updated = run(
        &tools,
        "update_work_item",
        json!({"work_item_id": 21, "status": "in_progress"}),
    )
    .await
    .unwrap();
    assert!(updated.starts_with("Updated work item: Signup page (ID: 21)"));

    let item = tracker.work_item(21).await.unwrap();
    assert_eq!(item["status"], "in_progress");
    assert_eq!(item["priority"], 3);
    assert_eq!(item["estimate_points"], 3);
}

#[tokio::test]
async fn test_add_sprint_member() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);

    let added = run(
        &tools,
        "add_sprint_member",
        json!({"sprint_id": 10, "user_id": 7}),
    )
    .await
    .unwrap();
    assert_eq!(added, "Added user 7 to sprint 10");
    assert_eq!(tracker.sprint_members(10).await, vec![7]);

    let err = run(
        &tools,
        "add_sprint_member",
        json!({"sprint_id": 10, "user_id": 7}),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string().split(':').next(), Some("add_sprint_member 7 to sprint 10"));
}

#[tokio::test]
async fn test_sprint_report() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);
    run(
        &tools,
        "bulk_assign_to_sprint",
        json!({"sprint_id": 10, "work_item_ids": [21, 22]}),
    )
    .await
    .unwrap();

    let report = run(
        &tools,
        "generate_sprint_report",
        json!({"sprint_id": 10, "project_id": 1}),
    )
    .await
    .unwrap();

    assert!(report.starts_with("Sprint Report: Sprint 10"));
    assert!(report.contains("Story Points:\n  Completed: 5\n  Total: 8\n  Progress: 62.5%"));
    assert!(report.contains("Tasks:\n  Completed: 1\n  Total: 3"));
    assert!(report.ends_with("Actual: 5"));
}

#[tokio::test]
async fn test_upstream_failure_is_reported_once() {
    let tracker = seeded_tracker();
    let tools = tools(&tracker);
    tracker.fail_next(503, "Service Unavailable").await;

    let err = run(&tools, "list_projects", Value::Null).await.unwrap_err();
    assert!(err.to_string().starts_with("list_projects: "));
    assert!(err.to_string().contains("503"));

    let projects = run(&tools, "list_projects", Value::Null).await.unwrap();
    assert!(projects.starts_with("Found 1 projects:"));
}

// =============================================================================
// Resources
// =============================================================================

#[tokio::test]
async fn test_read_backlog_resource() {
    let tools = tools(&seeded_tracker());
    let uri: ResourceUri = "backlog://1".parse().unwrap();

    let text = tools.read_resource(uri).await.unwrap();
    let items: Vec<Value> = serde_json::from_str(&text).unwrap();

    let ids: Vec<u64> = items.iter().filter_map(|i| i["id"].as_u64()).collect();
    assert_eq!(ids, vec![21, 22]);
}

#[tokio::test]
async fn test_read_missing_sprint_resource() {
    let tools = tools(&seeded_tracker());
    let err = tools
        .read_resource("sprint://99".parse().unwrap())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("read sprint://99: "));
}
