//! Error types for the ApiPort MCP server.

use thiserror::Error;

/// Errors that can occur in the ApiPort MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the ApiPort client.
    #[error(transparent)]
    Api(#[from] apiport::Error),

    /// A tool call named a tool that does not exist.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A resource URI that does not match any known resource.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// An operation failed. `operation` names the tool and its target,
    /// e.g. `get_project 999`.
    #[error("{operation}: {source}")]
    Call {
        /// What was being done.
        operation: String,
        /// Why it failed.
        #[source]
        source: apiport::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MCP protocol error.
    #[error("MCP error: {0}")]
    Mcp(String),
}

impl Error {
    /// Attach the operation that failed to a client error.
    pub fn call(operation: impl Into<String>, source: apiport::Error) -> Self {
        Self::Call {
            operation: operation.into(),
            source,
        }
    }

    /// The underlying client error, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&apiport::Error> {
        match self {
            Self::Api(e) | Self::Call { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Result type for ApiPort MCP operations.
pub type Result<T> = std::result::Result<T, Error>;
