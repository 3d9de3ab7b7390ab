//! MCP server implementation.
//!
//! This module contains the main server setup using rmcp. Tool failures are
//! reported as tool results with `is_error` set, so the client sees the
//! message; only protocol-level problems (bad arguments, unknown resources)
//! become MCP errors.

use crate::context::Context;
use crate::error::Error;
use crate::models::{
    ActivateSprintParams, AddSprintMemberParams, BulkAssignParams, CloseSprintParams,
    CreateSprintParams, CreateWorkItemParams, GetBacklogParams, GetProjectParams, GetSprintParams,
    GetWorkItemParams, ListSprintsParams, ListWorkItemsParams, SprintReportParams,
    UpdateWorkItemParams,
};
use crate::request::ToolRequest;
use crate::resources::{self, MIME_TYPE, ResourceUri};
use crate::tools::Tools;
use apiport::{Config, Tracker};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
    PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{
    ErrorData as McpError, RoleServer, ServiceExt, handler::server::ServerHandler, tool,
    tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::{info, warn};

/// The ApiPort MCP server.
///
/// Provides MCP protocol handling over stdio transport.
#[derive(Clone)]
pub struct ApiPortMcpServer {
    /// Shared context holding the tracker.
    context: Arc<Context>,
    /// Tool implementations.
    tools: Arc<Tools>,
    /// Tool router for MCP dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ApiPortMcpServer {
    #[tool(description = "List all projects accessible to the configured account.")]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        self.call("list_projects", Ok(ToolRequest::ListProjects)).await
    }

    #[tool(description = "Get details of a project by ID.")]
    async fn get_project(
        &self,
        Parameters(params): Parameters<GetProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("get_project", params.try_into()).await
    }

    #[tool(description = "List the sprints of a project.")]
    async fn list_sprints(
        &self,
        Parameters(params): Parameters<ListSprintsParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("list_sprints", params.try_into()).await
    }

    #[tool(description = "Get details of a sprint by ID.")]
    async fn get_sprint(
        &self,
        Parameters(params): Parameters<GetSprintParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("get_sprint", params.try_into()).await
    }

    #[tool(
        description = "Create a sprint in a project. Dates use YYYY-MM-DD; the end date must not precede the start date."
    )]
    async fn create_sprint(
        &self,
        Parameters(params): Parameters<CreateSprintParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("create_sprint", params.try_into()).await
    }

    #[tool(description = "Activate a planned sprint.")]
    async fn activate_sprint(
        &self,
        Parameters(params): Parameters<ActivateSprintParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("activate_sprint", params.try_into()).await
    }

    #[tool(description = "Close an active sprint.")]
    async fn close_sprint(
        &self,
        Parameters(params): Parameters<CloseSprintParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("close_sprint", params.try_into()).await
    }

    #[tool(description = "List the work items of a project.")]
    async fn list_work_items(
        &self,
        Parameters(params): Parameters<ListWorkItemsParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("list_work_items", params.try_into()).await
    }

    #[tool(description = "Get details of a work item by ID.")]
    async fn get_work_item(
        &self,
        Parameters(params): Parameters<GetWorkItemParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("get_work_item", params.try_into()).await
    }

    #[tool(
        description = "Create a work item (task, user_story, bug or epic) in a project. Priority ranges from 1 (highest) to 5; the default is 2."
    )]
    async fn create_work_item(
        &self,
        Parameters(params): Parameters<CreateWorkItemParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("create_work_item", params.try_into()).await
    }

    #[tool(
        description = "Update a work item. Only the fields provided are changed; at least one is required."
    )]
    async fn update_work_item(
        &self,
        Parameters(params): Parameters<UpdateWorkItemParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("update_work_item", params.try_into()).await
    }

    #[tool(description = "List the work items of a project that are not in any sprint.")]
    async fn get_backlog(
        &self,
        Parameters(params): Parameters<GetBacklogParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("get_backlog", params.try_into()).await
    }

    #[tool(description = "Assign several work items to a sprint in one call.")]
    async fn bulk_assign_to_sprint(
        &self,
        Parameters(params): Parameters<BulkAssignParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("bulk_assign_to_sprint", params.try_into()).await
    }

    #[tool(description = "Add a user to a sprint team.")]
    async fn add_sprint_member(
        &self,
        Parameters(params): Parameters<AddSprintMemberParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("add_sprint_member", params.try_into()).await
    }

    #[tool(
        description = "Generate a progress report for a sprint: story points, task completion and velocity."
    )]
    async fn generate_sprint_report(
        &self,
        Parameters(params): Parameters<SprintReportParams>,
    ) -> Result<CallToolResult, McpError> {
        self.call("generate_sprint_report", params.try_into()).await
    }
}

impl ApiPortMcpServer {
    /// Create a server that connects to ApiPort using `config`.
    ///
    /// No network traffic happens until the first tool call.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::from_context(Context::new(config))
    }

    /// Create a server backed by an existing tracker.
    #[must_use]
    pub fn with_tracker(config: Config, tracker: Arc<dyn Tracker>) -> Self {
        Self::from_context(Context::with_tracker(config, tracker))
    }

    fn from_context(context: Context) -> Self {
        let context = Arc::new(context);
        let tools = Arc::new(Tools::new(Arc::clone(&context)));

        Self {
            context,
            tools,
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the context.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Serve MCP over stdin/stdout until the client disconnects.
    ///
    /// # Errors
    ///
    /// Returns `Error::Mcp` if the transport fails.
    pub async fn run(self) -> crate::Result<()> {
        info!("Serving MCP over stdio");
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        service
            .waiting()
            .await
            .map_err(|e| Error::Mcp(e.to_string()))?;
        Ok(())
    }

    async fn call(
        &self,
        tool: &str,
        request: apiport::Result<ToolRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = match request {
            Ok(request) => self.tools.execute(request).await,
            Err(e) => Err(Error::call(tool, e)),
        };
        Ok(match result {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                warn!(tool, error = %e, "Tool call failed");
                CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
            }
        })
    }
}

#[tool_handler]
impl ServerHandler for ApiPortMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "apiport-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "ApiPort MCP server for project management. Use list_projects to find project IDs, \
                 then manage sprints and work items. Resources expose raw JSON."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(resources::resources()))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(
            resources::resource_templates(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self.read(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: request.uri,
                mime_type: Some(MIME_TYPE.to_string()),
                text,
                meta: None,
            }],
        })
    }
}

impl ApiPortMcpServer {
    async fn read(&self, uri: &str) -> Result<String, McpError> {
        let parsed: ResourceUri = uri
            .parse()
            .map_err(|e: Error| McpError::resource_not_found(e.to_string(), None))?;
        self.tools.read_resource(parsed).await.map_err(|e| {
            warn!(uri, error = %e, "Resource read failed");
            McpError::internal_error(e.to_string(), None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TOOL_NAMES;
    use apiport::mock::MockTracker;
    use rmcp::model::RawContent;

    fn server() -> ApiPortMcpServer {
        let tracker = MockTracker::new()
            .with_project(1, "Alpha")
            .with_sprint(4, 1, "Sprint 4", "planned");
        ApiPortMcpServer::with_tracker(Config::default(), Arc::new(tracker))
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "apiport-mcp");
        assert!(!info.server_info.version.is_empty());
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.instructions.is_some());
    }

    #[test]
    fn test_tool_router_has_all_tools() {
        let tools = server().tool_router.list_all();
        let mut names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
        names.sort_unstable();

        let mut expected = TOOL_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_new_server_is_lazy() {
        let server = ApiPortMcpServer::new(Config::default());
        assert!(!server.context().is_initialized());
    }

    #[tokio::test]
    async fn test_tool_success() {
        let result = server()
            .get_sprint(Parameters(GetSprintParams { sprint_id: 4 }))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Sprint: Sprint 4\nID: 4"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let result = server()
            .get_project(Parameters(GetProjectParams { project_id: 999 }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: get_project 999: API returned HTTP 404"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_error_result() {
        let result = server()
            .get_project(Parameters(GetProjectParams { project_id: 0 }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: get_project: "));
    }

    #[tokio::test]
    async fn test_read_unknown_resource() {
        let err = server().read("epic://1").await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_read_project_resource() {
        let text = server().read("project://1").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "Alpha");
    }
}
