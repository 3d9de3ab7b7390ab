//! MCP server for the ApiPort project management API.
//!
//! This crate provides an MCP (Model Context Protocol) server that exposes
//! ApiPort projects, sprints and work items to AI assistants.
//!
//! # Architecture
//!
//! The server uses the `rmcp` crate for MCP protocol handling and wraps the
//! [`apiport::Tracker`] trait. Tool arguments are validated into a
//! [`request::ToolRequest`] before any network call; [`tools::Tools`] runs
//! the request and renders plain text.
//!
//! # Tools
//!
//! ## Projects
//! - `list_projects` - List accessible projects
//! - `get_project` - Show one project
//!
//! ## Sprints
//! - `list_sprints`, `get_sprint`, `create_sprint`
//! - `activate_sprint`, `close_sprint` - Lifecycle transitions
//! - `add_sprint_member` - Add a user to the sprint team
//! - `generate_sprint_report` - Story points, task completion and velocity
//!
//! ## Work Items
//! - `list_work_items`, `get_work_item`, `create_work_item`, `update_work_item`
//! - `get_backlog` - Items not in any sprint
//! - `bulk_assign_to_sprint` - Move several items into a sprint
//!
//! # Resources
//!
//! `project://list`, `project://{id}`, `sprint://{id}` and
//! `backlog://{project_id}` return the raw JSON.

pub mod cli;
pub mod context;
pub mod error;
pub mod format;
pub mod models;
pub mod report;
pub mod request;
pub mod resources;
pub mod server;
pub mod tools;

pub use error::{Error, Result};
pub use server::ApiPortMcpServer;
