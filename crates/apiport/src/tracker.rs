//! The tracker abstraction.
//!
//! [`Tracker`] lists every operation the ApiPort task manager offers. The
//! HTTP implementation is [`ApiPortClient`](crate::client::ApiPortClient);
//! tests use `MockTracker` (feature `test-util`), an in-memory stand-in with
//! the same observable behavior.
//!
//! Resources come back as untyped JSON. Single-object calls return the object
//! itself, with the response envelope (`{"project": {...}}`) removed; list
//! calls return the inner array.

use crate::domain::{
    NewSprint, NewWorkItem, ProjectId, SprintId, UserId, WorkItemId, WorkItemUpdate,
};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Operations offered by the ApiPort task manager.
///
/// Implementations must be `Send + Sync` so a single instance can serve
/// concurrent tool calls.
#[async_trait]
pub trait Tracker: Send + Sync {
    // ========== Projects ==========

    /// List all accessible projects.
    async fn list_projects(&self) -> Result<Vec<Value>>;

    /// Get one project.
    async fn get_project(&self, id: ProjectId) -> Result<Value>;

    // ========== Sprints ==========

    /// List the sprints of a project.
    async fn list_sprints(&self, project: ProjectId) -> Result<Vec<Value>>;

    /// Get one sprint.
    async fn get_sprint(&self, id: SprintId) -> Result<Value>;

    /// Create a planned sprint in a project.
    async fn create_sprint(&self, project: ProjectId, sprint: &NewSprint) -> Result<Value>;

    /// Start a planned sprint.
    async fn activate_sprint(&self, id: SprintId) -> Result<Value>;

    /// Close an active sprint.
    async fn close_sprint(&self, id: SprintId) -> Result<Value>;

    // ========== Work items ==========

    /// List the work items of a project.
    async fn list_work_items(&self, project: ProjectId) -> Result<Vec<Value>>;

    /// Get one work item.
    async fn get_work_item(&self, id: WorkItemId) -> Result<Value>;

    /// Create a work item in a project.
    async fn create_work_item(&self, project: ProjectId, item: &NewWorkItem) -> Result<Value>;

    /// Change fields of a work item.
    async fn update_work_item(&self, id: WorkItemId, update: &WorkItemUpdate) -> Result<Value>;

    // ========== Backlog ==========

    /// Work items of a project not assigned to any sprint.
    async fn get_backlog(&self, project: ProjectId) -> Result<Vec<Value>>;

    /// Move several work items into a sprint at once.
    async fn bulk_assign_to_sprint(&self, sprint: SprintId, items: &[WorkItemId]) -> Result<Value>;

    // ========== Sprint members ==========

    /// Add a user to a sprint team.
    async fn add_sprint_member(&self, sprint: SprintId, user: UserId) -> Result<Value>;

    /// Remove a membership from a sprint team.
    async fn remove_sprint_member(&self, sprint: SprintId, member_id: u64) -> Result<Value>;
}
