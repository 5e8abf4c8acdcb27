use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use greenhouse_mcp::{HarvestConfig, build_server};

/// MCP server for the Greenhouse Harvest API, speaking JSON-RPC on stdio.
#[derive(Debug, Parser)]
#[command(name = "greenhouse-mcp", version, about)]
struct Cli {
    /// Dotenv file to read; defaults to `.env` in the working directory
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Override the Harvest API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the tool definitions as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = match &cli.env_file {
        Some(path) => HarvestConfig::from_env_file(path)?,
        None => {
            dotenvy::dotenv().ok();
            HarvestConfig::from_env()?
        }
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    tracing::debug!(?config, "Configuration loaded");

    let server = build_server(&config).context("Failed to create Greenhouse client")?;

    if cli.list_tools {
        let definitions = server.executor().get_tool_definitions();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    tracing::info!(base_url = %config.base_url, "Starting Greenhouse MCP server");
    server.serve_stdio().await?;
    Ok(())
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
