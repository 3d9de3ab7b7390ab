//! Validated tool requests.
//!
//! [`ToolRequest`] has one variant per tool, carrying typed arguments. A
//! request can only be built through validation, either from the tool's
//! parameter struct (`TryFrom`) or from a tool name plus raw JSON arguments
//! ([`ToolRequest::parse`]). Nothing reaches the tracker without passing
//! through one of these.

use crate::error::{Error, Result};
use crate::models::{
    ActivateSprintParams, AddSprintMemberParams, BulkAssignParams, CloseSprintParams,
    CreateSprintParams, CreateWorkItemParams, GetBacklogParams, GetProjectParams, GetSprintParams,
    GetWorkItemParams, ListProjectsParams, ListSprintsParams, ListWorkItemsParams,
    SprintReportParams, UpdateWorkItemParams,
};
use apiport::domain::{
    NewSprint, NewWorkItem, Priority, ProjectId, SprintId, UserId, WorkItemId, WorkItemUpdate,
    dedup_work_items, parse_date,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Names of all tools, in the order they are listed.
pub const TOOL_NAMES: [&str; 15] = [
    "list_projects",
    "get_project",
    "list_sprints",
    "get_sprint",
    "create_sprint",
    "activate_sprint",
    "close_sprint",
    "list_work_items",
    "get_work_item",
    "create_work_item",
    "update_work_item",
    "get_backlog",
    "bulk_assign_to_sprint",
    "add_sprint_member",
    "generate_sprint_report",
];

/// A tool invocation with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// List all projects.
    ListProjects,
    /// Show one project.
    GetProject {
        /// Project to show.
        project_id: ProjectId,
    },
    /// List the sprints of a project.
    ListSprints {
        /// Owning project.
        project_id: ProjectId,
    },
    /// Show one sprint.
    GetSprint {
        /// Sprint to show.
        sprint_id: SprintId,
    },
    /// Create a sprint.
    CreateSprint {
        /// Owning project.
        project_id: ProjectId,
        /// Sprint to create.
        sprint: NewSprint,
    },
    /// Start a planned sprint.
    ActivateSprint {
        /// Sprint to start.
        sprint_id: SprintId,
    },
    /// Close an active sprint.
    CloseSprint {
        /// Sprint to close.
        sprint_id: SprintId,
    },
    /// List the work items of a project.
    ListWorkItems {
        /// Owning project.
        project_id: ProjectId,
    },
    /// Show one work item.
    GetWorkItem {
        /// Work item to show.
        work_item_id: WorkItemId,
    },
    /// Create a work item.
    CreateWorkItem {
        /// Owning project.
        project_id: ProjectId,
        /// Work item to create.
        item: NewWorkItem,
    },
    /// Change fields of a work item.
    UpdateWorkItem {
        /// Work item to change.
        work_item_id: WorkItemId,
        /// Fields to change.
        update: WorkItemUpdate,
    },
    /// List unassigned work items of a project.
    GetBacklog {
        /// Owning project.
        project_id: ProjectId,
    },
    /// Move work items into a sprint.
    BulkAssignToSprint {
        /// Target sprint.
        sprint_id: SprintId,
        /// Items to move, without duplicates.
        work_item_ids: Vec<WorkItemId>,
    },
    /// Add a user to a sprint team.
    AddSprintMember {
        /// Target sprint.
        sprint_id: SprintId,
        /// User to add.
        user_id: UserId,
    },
    /// Summarize a sprint's progress.
    GenerateSprintReport {
        /// Sprint to report on.
        sprint_id: SprintId,
        /// Project whose work items are scanned.
        project_id: ProjectId,
    },
}

impl ToolRequest {
    /// Build a request from a tool name and its raw JSON arguments.
    ///
    /// Missing arguments may be given as `null`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTool` for names outside [`TOOL_NAMES`] and
    /// `Error::Call` wrapping a validation error for bad arguments.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let arguments = match arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };

        let request = match name {
            "list_projects" => args::<ListProjectsParams>(arguments).and_then(Self::try_from),
            "get_project" => args::<GetProjectParams>(arguments).and_then(Self::try_from),
            "list_sprints" => args::<ListSprintsParams>(arguments).and_then(Self::try_from),
            "get_sprint" => args::<GetSprintParams>(arguments).and_then(Self::try_from),
            "create_sprint" => args::<CreateSprintParams>(arguments).and_then(Self::try_from),
            "activate_sprint" => args::<ActivateSprintParams>(arguments).and_then(Self::try_from),
            "close_sprint" => args::<CloseSprintParams>(arguments).and_then(Self::try_from),
            "list_work_items" => args::<ListWorkItemsParams>(arguments).and_then(Self::try_from),
            "get_work_item" => args::<GetWorkItemParams>(arguments).and_then(Self::try_from),
            "create_work_item" => args::<CreateWorkItemParams>(arguments).and_then(Self::try_from),
            "update_work_item" => args::<UpdateWorkItemParams>(arguments).and_then(Self::try_from),
            "get_backlog" => args::<GetBacklogParams>(arguments).and_then(Self::try_from),
            "bulk_assign_to_sprint" => args::<BulkAssignParams>(arguments).and_then(Self::try_from),
            "add_sprint_member" => {
                args::<AddSprintMemberParams>(arguments).and_then(Self::try_from)
            }
            "generate_sprint_report" => {
                args::<SprintReportParams>(arguments).and_then(Self::try_from)
            }
            other => return Err(Error::UnknownTool(other.to_string())),
        };

        request.map_err(|e| Error::call(name, e))
    }

    /// The tool this request invokes.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListProjects => "list_projects",
            Self::GetProject { .. } => "get_project",
            Self::ListSprints { .. } => "list_sprints",
            Self::GetSprint { .. } => "get_sprint",
            Self::CreateSprint { .. } => "create_sprint",
            Self::ActivateSprint { .. } => "activate_sprint",
            Self::CloseSprint { .. } => "close_sprint",
            Self::ListWorkItems { .. } => "list_work_items",
            Self::GetWorkItem { .. } => "get_work_item",
            Self::CreateWorkItem { .. } => "create_work_item",
            Self::UpdateWorkItem { .. } => "update_work_item",
            Self::GetBacklog { .. } => "get_backlog",
            Self::BulkAssignToSprint { .. } => "bulk_assign_to_sprint",
            Self::AddSprintMember { .. } => "add_sprint_member",
            Self::GenerateSprintReport { .. } => "generate_sprint_report",
        }
    }

    /// Tool name plus its target, used as error context (`get_project 999`).
    #[must_use]
    pub fn describe(&self) -> String {
        let name = self.name();
        match self {
            Self::ListProjects => name.to_string(),
            Self::GetProject { project_id }
            | Self::ListSprints { project_id }
            | Self::ListWorkItems { project_id }
            | Self::GetBacklog { project_id } => format!("{name} {project_id}"),
            Self::CreateSprint { project_id, .. } | Self::CreateWorkItem { project_id, .. } => {
                format!("{name} in project {project_id}")
            }
            Self::GetSprint { sprint_id }
            | Self::ActivateSprint { sprint_id }
            | Self::CloseSprint { sprint_id }
            | Self::BulkAssignToSprint { sprint_id, .. }
            | Self::GenerateSprintReport { sprint_id, .. } => format!("{name} {sprint_id}"),
            Self::GetWorkItem { work_item_id } | Self::UpdateWorkItem { work_item_id, .. } => {
                format!("{name} {work_item_id}")
            }
            Self::AddSprintMember { sprint_id, user_id } => {
                format!("{name} {user_id} to sprint {sprint_id}")
            }
        }
    }
}

fn args<T: DeserializeOwned>(arguments: Value) -> apiport::Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| apiport::Error::validation("arguments", e.to_string()))
}

fn optional<T>(
    raw: Option<u64>,
    wrap: impl FnOnce(u64) -> apiport::Result<T>,
) -> apiport::Result<Option<T>> {
    raw.map(wrap).transpose()
}

fn optional_date(
    field: &'static str,
    raw: Option<&str>,
) -> apiport::Result<Option<NaiveDate>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(field, s))
        .transpose()
}

impl TryFrom<ListProjectsParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(_: ListProjectsParams) -> apiport::Result<Self> {
        Ok(Self::ListProjects)
    }
}

impl TryFrom<GetProjectParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: GetProjectParams) -> apiport::Result<Self> {
        Ok(Self::GetProject {
            project_id: ProjectId::new(params.project_id)?,
        })
    }
}

impl TryFrom<ListSprintsParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: ListSprintsParams) -> apiport::Result<Self> {
        Ok(Self::ListSprints {
            project_id: ProjectId::new(params.project_id)?,
        })
    }
}

impl TryFrom<GetSprintParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: GetSprintParams) -> apiport::Result<Self> {
        Ok(Self::GetSprint {
            sprint_id: SprintId::new(params.sprint_id)?,
        })
    }
}

impl TryFrom<CreateSprintParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: CreateSprintParams) -> apiport::Result<Self> {
        let start = optional_date("start_date", params.start_date.as_deref())?;
        let end = optional_date("end_date", params.end_date.as_deref())?;
        let sprint = NewSprint::new(&params.name)?
            .with_goal(params.goal)
            .with_dates(start, end)?
            .with_velocity_target(params.velocity_target);

        Ok(Self::CreateSprint {
            project_id: ProjectId::new(params.project_id)?,
            sprint,
        })
    }
}

impl TryFrom<ActivateSprintParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: ActivateSprintParams) -> apiport::Result<Self> {
        Ok(Self::ActivateSprint {
            sprint_id: SprintId::new(params.sprint_id)?,
        })
    }
}

impl TryFrom<CloseSprintParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: CloseSprintParams) -> apiport::Result<Self> {
        Ok(Self::CloseSprint {
            sprint_id: SprintId::new(params.sprint_id)?,
        })
    }
}

impl TryFrom<ListWorkItemsParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: ListWorkItemsParams) -> apiport::Result<Self> {
        Ok(Self::ListWorkItems {
            project_id: ProjectId::new(params.project_id)?,
        })
    }
}

impl TryFrom<GetWorkItemParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: GetWorkItemParams) -> apiport::Result<Self> {
        Ok(Self::GetWorkItem {
            work_item_id: WorkItemId::new(params.work_item_id)?,
        })
    }
}

impl TryFrom<CreateWorkItemParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: CreateWorkItemParams) -> apiport::Result<Self> {
        let mut item = NewWorkItem::new(&params.title)?
            .with_description(params.description)
            .with_estimate(params.estimate_points)
            .with_assignee(optional(params.assignee_id, UserId::new)?)
            .with_sprint(optional(params.sprint_id, SprintId::new)?)
            .with_parent(optional(params.parent_id, WorkItemId::new)?);
        if let Some(item_type) = params.item_type.as_deref() {
            item = item.with_type(item_type.parse()?);
        }
        if let Some(priority) = params.priority {
            item = item.with_priority(Priority::new(priority)?);
        }

        Ok(Self::CreateWorkItem {
            project_id: ProjectId::new(params.project_id)?,
            item,
        })
    }
}

impl TryFrom<UpdateWorkItemParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: UpdateWorkItemParams) -> apiport::Result<Self> {
        let update = WorkItemUpdate {
            status: params.status.as_deref().map(str::parse).transpose()?,
            assignee_id: optional(params.assignee_id, UserId::new)?,
            sprint_id: optional(params.sprint_id, SprintId::new)?,
            priority: params.priority.map(Priority::new).transpose()?,
            estimate_points: params.estimate_points,
            title: params.title.map(|t| t.trim().to_string()),
            description: params.description,
        };
        update.validate()?;

        Ok(Self::UpdateWorkItem {
            work_item_id: WorkItemId::new(params.work_item_id)?,
            update,
        })
    }
}

impl TryFrom<GetBacklogParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: GetBacklogParams) -> apiport::Result<Self> {
        Ok(Self::GetBacklog {
            project_id: ProjectId::new(params.project_id)?,
        })
    }
}

impl TryFrom<BulkAssignParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: BulkAssignParams) -> apiport::Result<Self> {
        let ids = params
            .work_item_ids
            .into_iter()
            .map(WorkItemId::new)
            .collect::<apiport::Result<Vec<_>>>()?;

        Ok(Self::BulkAssignToSprint {
            sprint_id: SprintId::new(params.sprint_id)?,
            work_item_ids: dedup_work_items(&ids)?,
        })
    }
}

impl TryFrom<AddSprintMemberParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: AddSprintMemberParams) -> apiport::Result<Self> {
        Ok(Self::AddSprintMember {
            sprint_id: SprintId::new(params.sprint_id)?,
            user_id: UserId::new(params.user_id)?,
        })
    }
}

impl TryFrom<SprintReportParams> for ToolRequest {
    type Error = apiport::Error;

    fn try_from(params: SprintReportParams) -> apiport::Result<Self> {
        Ok(Self::GenerateSprintReport {
            sprint_id: SprintId::new(params.sprint_id)?,
            project_id: ProjectId::new(params.project_id)?,
        })
    }
}
