//! Command-line arguments for the server binary.
//!
//! Flags override the configuration file and environment.

use apiport::Config;
use clap::Parser;
use std::path::PathBuf;

/// ApiPort MCP server
///
/// Exposes ApiPort projects, sprints and work items to MCP clients over stdio.
/// Credentials come from `APIPORT_EMAIL` and `APIPORT_PASSWORD` (a `.env`
/// file in the working directory is read too).
#[derive(Parser, Debug, Default)]
#[command(name = "apiport-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ApiPort base URL, e.g. https://api.apiport.hu
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    ///
    /// # Errors
    ///
    /// Returns `apiport::Error::Config` if the result is inconsistent.
    pub fn apply(&self, config: &mut Config) -> apiport::Result<()> {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim().to_string();
        }
        if self.debug {
            config.debug = true;
        }
        config.validate()
    }
}
