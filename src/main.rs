//! Data Source Agent - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to work with registered data sources: SQL databases, REST APIs, JSON and
//! plain files, and saved Prefect flow scripts.

use clap::Parser;
use data_source_agent::config::{Config, TransportMode};
use data_source_agent::mcp::AgentService;
use data_source_agent::registry::SourceRegistry;
use data_source_agent::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env so credential env vars referenced by the registry are available
    dotenvy::dotenv().ok();

    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting Data Source Agent v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load the source registry from the YAML file
    let registry = match SourceRegistry::load(&config.sources).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: failed to load data source registry: {}", e);
            eprintln!();
            eprintln!("Usage: data-source-agent --sources <path-to-yaml>");
            eprintln!();
            eprintln!("The registry file lists named data sources, for example:");
            eprintln!("  data_sources:");
            eprintln!("    - name: MainDB");
            eprintln!("      type: postgres");
            eprintln!("      description: Primary application database");
            eprintln!("      credentials:");
            eprintln!("        host_env: MAINDB_HOST");
            eprintln!("        port_env: MAINDB_PORT");
            eprintln!("        dbname_env: MAINDB_NAME");
            eprintln!("        user_env: MAINDB_USER");
            eprintln!("        password_env: MAINDB_PASSWORD");
            std::process::exit(1);
        }
    };

    if registry.is_empty() {
        tracing::warn!(file = %config.sources, "Registry contains no data sources");
    } else {
        info!(
            count = registry.len(),
            file = %config.sources,
            "Loaded data source registry"
        );
    }

    let service = AgentService::new(&config, registry)?;

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(service);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                service,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
