//! Tool and resource dispatch.
//!
//! [`Tools`] turns a validated [`ToolRequest`] into exactly one tracker
//! operation (two for the sprint report) and renders the result as text.
//! Every failure comes back as [`Error::Call`] naming the operation, so the
//! caller can show `Error: get_project 999: API returned HTTP 404: ...`.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::format;
use crate::report::SprintReport;
use crate::request::ToolRequest;
use crate::resources::ResourceUri;
use apiport::Tracker;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Tool implementations for the ApiPort MCP server.
#[derive(Debug)]
pub struct Tools {
    context: Arc<Context>,
}

impl Tools {
    /// Create a new Tools instance with the given context.
    #[must_use]
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Run a tool and render its result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Call` if the tracker cannot be created or the
    /// operation fails.
    pub async fn execute(&self, request: ToolRequest) -> Result<String> {
        let operation = request.describe();
        debug!(%operation, "Executing tool");

        let tracker = self
            .context
            .tracker()
            .await
            .map_err(|e| Error::call(&operation, e))?;
        dispatch(tracker.as_ref(), request)
            .await
            .map_err(|e| Error::call(operation, e))
    }

    /// Read a resource as pretty-printed JSON with sorted keys.
    ///
    /// # Errors
    ///
    /// Returns `Error::Call` if the tracker cannot be created or the read
    /// fails.
    pub async fn read_resource(&self, uri: ResourceUri) -> Result<String> {
        let operation = format!("read {uri}");
        debug!(%operation, "Reading resource");

        let tracker = self
            .context
            .tracker()
            .await
            .map_err(|e| Error::call(&operation, e))?;
        let value = fetch(tracker.as_ref(), uri)
            .await
            .map_err(|e| Error::call(&operation, e))?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// `serde_json` maps are ordered, so serialization sorts keys.
async fn fetch(tracker: &dyn Tracker, uri: ResourceUri) -> apiport::Result<Value> {
    Ok(match uri {
        ResourceUri::ProjectList => Value::Array(tracker.list_projects().await?),
        ResourceUri::Project(id) => tracker.get_project(id).await?,
        ResourceUri::Sprint(id) => tracker.get_sprint(id).await?,
        ResourceUri::Backlog(id) => Value::Array(tracker.get_backlog(id).await?),
    })
}

async fn dispatch(tracker: &dyn Tracker, request: ToolRequest) -> apiport::Result<String> {
    let text = match request {
        ToolRequest::ListProjects => format::projects(&tracker.list_projects().await?),
        ToolRequest::GetProject { project_id } => {
            format::project(&tracker.get_project(project_id).await?)
        }
        ToolRequest::ListSprints { project_id } => {
            format::sprints(&tracker.list_sprints(project_id).await?)
        }
        ToolRequest::GetSprint { sprint_id } => format::sprint(&tracker.get_sprint(sprint_id).await?),
        ToolRequest::CreateSprint { project_id, sprint } => {
            format::sprint_created(&tracker.create_sprint(project_id, &sprint).await?)
        }
        ToolRequest::ActivateSprint { sprint_id } => {
            format::sprint_transitioned("Activated", &tracker.activate_sprint(sprint_id).await?)
        }
        ToolRequest::CloseSprint { sprint_id } => {
            format::sprint_transitioned("Closed", &tracker.close_sprint(sprint_id).await?)
        }
        ToolRequest::ListWorkItems { project_id } => {
            format::work_items(&tracker.list_work_items(project_id).await?)
        }
        ToolRequest::GetWorkItem { work_item_id } => {
            format::work_item(&tracker.get_work_item(work_item_id).await?)
        }
        ToolRequest::CreateWorkItem { project_id, item } => {
            format::work_item_created(&tracker.create_work_item(project_id, &item).await?)
        }
        ToolRequest::UpdateWorkItem {
            work_item_id,
            update,
        } => format::work_item_updated(&tracker.update_work_item(work_item_id, &update).await?),
        ToolRequest::GetBacklog { project_id } => {
            format::backlog(&tracker.get_backlog(project_id).await?)
        }
        ToolRequest::BulkAssignToSprint {
            sprint_id,
            work_item_ids,
        } => {
            tracker
                .bulk_assign_to_sprint(sprint_id, &work_item_ids)
                .await?;
            format!(
                "Assigned {} items to sprint {sprint_id}",
                work_item_ids.len()
            )
        }
        ToolRequest::AddSprintMember { sprint_id, user_id } => {
            tracker.add_sprint_member(sprint_id, user_id).await?;
            format!("Added user {user_id} to sprint {sprint_id}")
        }
        ToolRequest::GenerateSprintReport {
            sprint_id,
            project_id,
        } => {
            let sprint = tracker.get_sprint(sprint_id).await?;
            let items = tracker.list_work_items(project_id).await?;
            SprintReport::compute(sprint_id, sprint, &items).to_string()
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport::Config;
    use apiport::mock::MockTracker;
    use serde_json::json;

    fn tools_with(tracker: Arc<MockTracker>) -> Tools {
        Tools::new(Arc::new(Context::with_tracker(Config::default(), tracker)))
    }

    #[tokio::test]
    async fn test_execute_renders_result() {
        let tracker = Arc::new(MockTracker::new().with_project(1, "Alpha"));
        let tools = tools_with(Arc::clone(&tracker));

        let text = tools.execute(ToolRequest::ListProjects).await.unwrap();
        assert_eq!(text, "Found 1 projects:\n\n- ID 1: Alpha (status: active)");
        assert_eq!(tracker.call_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_error_names_operation() {
        let tools = tools_with(Arc::new(MockTracker::new()));
        let request = ToolRequest::parse("get_project", json!({"project_id": 999})).unwrap();

        let err = tools.execute(request).await.unwrap_err();
        assert!(err.to_string().starts_with("get_project 999: API returned HTTP 404"));
    }

    #[tokio::test]
    async fn test_missing_credentials_surface_as_call_error() {
        let tools = Tools::new(Arc::new(Context::new(Config::default())));
        let err = tools.execute(ToolRequest::ListProjects).await.unwrap_err();
        assert!(matches!(
            err.api_error(),
            Some(apiport::Error::Config(_))
        ));
        assert!(err.to_string().starts_with("list_projects: "));
    }

    #[tokio::test]
    async fn test_read_resource_is_sorted_json() {
        let tools = tools_with(Arc::new(MockTracker::new().with_project(2, "Beta")));
        let text = tools
            .read_resource("project://2".parse().unwrap())
            .await
            .unwrap();

        let created = text.find("\"created_at\"").unwrap();
        let name = text.find("\"name\"").unwrap();
        assert!(created < name);
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap()["name"], "Beta");
    }
}
