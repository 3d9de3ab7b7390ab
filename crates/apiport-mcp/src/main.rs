//! ApiPort MCP server binary.
//!
//! This binary runs the MCP server using stdio transport. Logs go to stderr
//! so stdout stays reserved for the protocol.

use apiport::Config;
use apiport_mcp::ApiPortMcpServer;
use apiport_mcp::cli::Args;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "apiport=info,apiport_mcp=info";
const DEBUG_FILTER: &str = "apiport=debug,apiport_mcp=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::resolve(args.config.as_deref()).await?;
    args.apply(&mut config)?;

    let default_filter = if config.debug {
        DEBUG_FILTER
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.base_url(),
        "Starting apiport-mcp server"
    );

    let server = ApiPortMcpServer::new(config);
    server.run().await?;

    Ok(())
}
