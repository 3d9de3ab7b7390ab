//! ApiPort - an authenticated client for the ApiPort task manager.
//!
//! This crate talks to the ApiPort REST API (projects, sprints, work items,
//! backlog). It exchanges an email and password for a short-lived bearer
//! token, caches it, renews it before it expires, and re-authenticates once
//! when a request is rejected with 401.
//!
//! # Example
//!
//! ```no_run
//! use apiport::{ApiPortClient, Config, Tracker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> apiport::Result<()> {
//!     let config = Config::resolve(None).await?;
//!     let client = ApiPortClient::new(&config)?;
//!
//!     for project in client.list_projects().await? {
//!         println!("{} {}", project["id"], project["name"]);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod tracker;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::ApiPortClient;
pub use config::Config;
pub use error::{Error, Result};
pub use tracker::Tracker;
