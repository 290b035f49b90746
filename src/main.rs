//! # Data Service Main Entry Point
//!
//! Loads configuration, initializes tracing and the database pool, then
//! serves the HTTP API.

use clap::Parser;
use dataservice::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "dataservice", version, about = "Catalog data service")]
struct Cli {
    /// Apply pending database migrations before serving
    #[arg(long)]
    migrate: bool,

    /// Apply migrations and exit without serving
    #[arg(long, conflicts_with = "migrate")]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    if cli.migrate || cli.migrate_only {
        run_migrations(&db).await?;
    }
    if cli.migrate_only {
        return Ok(());
    }

    run_server(config, db).await
}
