//! Read-only MCP resources.
//!
//! | URI | Content |
//! |-----|---------|
//! | `project://list` | all projects |
//! | `project://{id}` | one project |
//! | `sprint://{id}` | one sprint |
//! | `backlog://{project_id}` | unassigned work items of a project |

use crate::error::Error;
use apiport::domain::{ProjectId, SprintId};
use rmcp::model::{AnnotateAble, RawResource, RawResourceTemplate, Resource, ResourceTemplate};
use std::fmt;
use std::str::FromStr;

/// MIME type of every resource.
pub const MIME_TYPE: &str = "application/json";

const PROJECT_SCHEME: &str = "project://";
const SPRINT_SCHEME: &str = "sprint://";
const BACKLOG_SCHEME: &str = "backlog://";
const PROJECT_LIST: &str = "project://list";

/// A parsed resource address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUri {
    /// `project://list`
    ProjectList,
    /// `project://{id}`
    Project(ProjectId),
    /// `sprint://{id}`
    Sprint(SprintId),
    /// `backlog://{project_id}`
    Backlog(ProjectId),
}

impl FromStr for ResourceUri {
    type Err = Error;

    fn from_str(uri: &str) -> Result<Self, Error> {
        let unknown = || Error::UnknownResource(uri.to_string());
        let uri_trimmed = uri.trim().trim_end_matches('/');

        if uri_trimmed == PROJECT_LIST {
            return Ok(Self::ProjectList);
        }
        if let Some(id) = uri_trimmed.strip_prefix(PROJECT_SCHEME) {
            return id.parse().map(Self::Project).map_err(|_| unknown());
        }
        if let Some(id) = uri_trimmed.strip_prefix(SPRINT_SCHEME) {
            return id.parse().map(Self::Sprint).map_err(|_| unknown());
        }
        if let Some(id) = uri_trimmed.strip_prefix(BACKLOG_SCHEME) {
            return id.parse().map(Self::Backlog).map_err(|_| unknown());
        }
        Err(unknown())
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectList => f.write_str(PROJECT_LIST),
            Self::Project(id) => write!(f, "{PROJECT_SCHEME}{id}"),
            Self::Sprint(id) => write!(f, "{SPRINT_SCHEME}{id}"),
            Self::Backlog(id) => write!(f, "{BACKLOG_SCHEME}{id}"),
        }
    }
}

/// Fixed resources.
#[must_use]
pub fn resources() -> Vec<Resource> {
    let mut list = RawResource::new(PROJECT_LIST, "Projects List");
    list.description = Some("List of all accessible projects".to_string());
    list.mime_type = Some(MIME_TYPE.to_string());
    vec![list.no_annotation()]
}

/// Parameterized resources.
#[must_use]
pub fn resource_templates() -> Vec<ResourceTemplate> {
    [
        ("project://{id}", "Project", "Details of one project"),
        ("sprint://{id}", "Sprint", "Details of one sprint"),
        (
            "backlog://{project_id}",
            "Project Backlog",
            "Work items of a project not assigned to any sprint",
        ),
    ]
    .into_iter()
    .map(|(uri_template, name, description)| {
        RawResourceTemplate {
            uri_template: uri_template.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some(MIME_TYPE.to_string()),
        }
        .no_annotation()
    })
    .collect()
}
