//! MCP tool parameter models.
//!
//! One struct per tool. Their JSON schemas are what the host sees; required
//! fields are plain values and optional fields are `Option`s. Values are
//! checked further when a struct is turned into a
//! [`ToolRequest`](crate::request::ToolRequest).

use schemars::JsonSchema;
use serde::Deserialize;

/// Parameters for `list_projects`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListProjectsParams {}

/// Parameters for `get_project`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetProjectParams {
    /// Project ID.
    pub project_id: u64,
}

/// Parameters for `list_sprints`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListSprintsParams {
    /// Project ID.
    pub project_id: u64,
}

/// Parameters for `get_sprint`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSprintParams {
    /// Sprint ID.
    pub sprint_id: u64,
}

/// Parameters for `create_sprint`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateSprintParams {
    /// Project ID.
    pub project_id: u64,

    /// Sprint name.
    pub name: String,

    /// Sprint goal.
    #[serde(default)]
    pub goal: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[serde(default)]
    pub start_date: Option<String>,

    /// End date (YYYY-MM-DD).
    #[serde(default)]
    pub end_date: Option<String>,

    /// Velocity target in story points.
    #[serde(default)]
    pub velocity_target: Option<u32>,
}

/// Parameters for `activate_sprint`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ActivateSprintParams {
    /// Sprint ID to activate.
    pub sprint_id: u64,
}

/// Parameters for `close_sprint`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CloseSprintParams {
    /// Sprint ID to close.
    pub sprint_id: u64,
}

/// Parameters for `list_work_items`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListWorkItemsParams {
    /// Project ID.
    pub project_id: u64,
}

/// Parameters for `get_work_item`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetWorkItemParams {
    /// Work item ID.
    pub work_item_id: u64,
}

/// Parameters for `create_work_item`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateWorkItemParams {
    /// Project ID.
    pub project_id: u64,

    /// Work item title.
    pub title: String,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Type: task, user_story, bug, or epic (default: task).
    #[serde(default)]
    pub item_type: Option<String>,

    /// Priority from 1 (highest) to 5 (default: 2).
    #[serde(default)]
    pub priority: Option<u8>,

    /// Story point estimate.
    #[serde(default)]
    pub estimate_points: Option<u32>,

    /// User ID of the assignee.
    #[serde(default)]
    pub assignee_id: Option<u64>,

    /// Sprint ID; omit to place the item in the backlog.
    #[serde(default)]
    pub sprint_id: Option<u64>,

    /// Parent work item ID.
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// Parameters for `update_work_item`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateWorkItemParams {
    /// Work item ID.
    pub work_item_id: u64,

    /// New status: todo, in_progress, or done.
    #[serde(default)]
    pub status: Option<String>,

    /// New assignee user ID.
    #[serde(default)]
    pub assignee_id: Option<u64>,

    /// Move to this sprint.
    #[serde(default)]
    pub sprint_id: Option<u64>,

    /// New priority from 1 (highest) to 5.
    #[serde(default)]
    pub priority: Option<u8>,

    /// New story point estimate.
    #[serde(default)]
    pub estimate_points: Option<u32>,

    /// New title.
    #[serde(default)]
    pub title: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters for `get_backlog`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetBacklogParams {
    /// Project ID.
    pub project_id: u64,
}

/// Parameters for `bulk_assign_to_sprint`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BulkAssignParams {
    /// Sprint ID.
    pub sprint_id: u64,

    /// Work item IDs to assign.
    pub work_item_ids: Vec<u64>,
}

/// Parameters for `add_sprint_member`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddSprintMemberParams {
    /// Sprint ID.
    pub sprint_id: u64,

    /// User ID to add.
    pub user_id: u64,
}

/// Parameters for `generate_sprint_report`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SprintReportParams {
    /// Sprint ID.
    pub sprint_id: u64,

    /// Project the sprint belongs to.
    pub project_id: u64,
}
