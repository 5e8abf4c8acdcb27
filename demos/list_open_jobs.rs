//! # List Open Jobs Example
//!
//! Lists open jobs through the Harvest client, then shows the tools the MCP
//! server would expose for the same client.
//!
//! ## Usage
//!
//! ```bash
//! export GREENHOUSE_API_KEY="your-api-key"
//! cargo run --example list_open_jobs
//! ```

use greenhouse_mcp::harvest::models::{Job, read_as};
use greenhouse_mcp::prelude::*;
use greenhouse_mcp::{HarvestConfig, tools};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = HarvestConfig::from_env()?;
    let client = HarvestClientBuilder::from_config(&config).build()?;
    println!("Greenhouse Harvest API at {}", client.base_url());

    let jobs = client
        .list_jobs(JobQuery::new(Pagination::new(10, 1)).with_status(JobStatus::Open))
        .await?;
    let jobs: Vec<Job> = read_as(&jobs).unwrap_or_default();
    println!("\nOpen jobs ({}):", jobs.len());
    for job in &jobs {
        println!("  - [{}] {}", job.id, job.name);
    }

    let registry = tools::registry(Arc::new(client));
    println!("\nAvailable tools ({}):", registry.len());
    for name in registry.names() {
        println!("  - {}", name);
    }

    println!("\nRun `greenhouse-mcp` to serve these tools to an MCP client over stdio.");
    Ok(())
}
