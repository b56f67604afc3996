//! Runtime configuration for the agent, parsed from CLI arguments and
//! environment variables via clap.

use std::time::Duration;

use clap::{Parser, ValueEnum};

pub const DEFAULT_SOURCES_FILE: &str = "data_sources.yaml";
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/mcp";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SAMPLE_LIMIT: u32 = 10;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 262_144;
pub const DEFAULT_FLOWS_DIR: &str = "flows";
pub const DEFAULT_FLOW_INTERPRETER: &str = "python3";
pub const DEFAULT_FLOW_TIMEOUT_SECS: u64 = 60;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output transport (default, for local MCP clients)
    Stdio,
    /// Streamable HTTP transport (for remote MCP clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// MCP server exposing configured data sources to AI assistants.
#[derive(Debug, Clone, Parser)]
#[command(name = "data-source-agent", version, about)]
pub struct Config {
    /// Path to the YAML data source registry
    #[arg(long, env = "DATA_AGENT_SOURCES", default_value = DEFAULT_SOURCES_FILE)]
    pub sources: String,

    /// Transport to serve MCP over
    #[arg(long, value_enum, env = "DATA_AGENT_TRANSPORT", default_value = "stdio")]
    pub transport: TransportMode,

    /// Host to bind the HTTP transport to
    #[arg(long, env = "DATA_AGENT_HTTP_HOST", default_value = DEFAULT_HTTP_HOST)]
    pub http_host: String,

    /// Port to bind the HTTP transport to
    #[arg(long, env = "DATA_AGENT_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// URL path the HTTP transport serves MCP on
    #[arg(long, env = "DATA_AGENT_MCP_ENDPOINT", default_value = DEFAULT_MCP_ENDPOINT)]
    pub mcp_endpoint: String,

    /// Default query timeout in seconds
    #[arg(long, env = "DATA_AGENT_QUERY_TIMEOUT", default_value_t = DEFAULT_QUERY_TIMEOUT_SECS)]
    pub query_timeout: u64,

    /// Timeout for outbound HTTP requests (API sources, remote files)
    #[arg(long, env = "DATA_AGENT_HTTP_TIMEOUT", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub http_timeout: u64,

    /// Default number of sample rows fetched per table
    #[arg(long, env = "DATA_AGENT_SAMPLE_LIMIT", default_value_t = DEFAULT_SAMPLE_LIMIT)]
    pub sample_limit: u32,

    /// Maximum bytes returned when reading a file source
    #[arg(long, env = "DATA_AGENT_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    pub max_file_bytes: u64,

    /// Directory where saved flow scripts are stored
    #[arg(long, env = "DATA_AGENT_FLOWS_DIR", default_value = DEFAULT_FLOWS_DIR)]
    pub flows_dir: String,

    /// Interpreter used to execute flow scripts
    #[arg(long, env = "DATA_AGENT_FLOW_INTERPRETER", default_value = DEFAULT_FLOW_INTERPRETER)]
    pub flow_interpreter: String,

    /// Timeout for flow script execution in seconds
    #[arg(long, env = "DATA_AGENT_FLOW_TIMEOUT", default_value_t = DEFAULT_FLOW_TIMEOUT_SECS)]
    pub flow_timeout: u64,

    /// Log level filter (e.g. "info", "data_source_agent=debug")
    #[arg(long, env = "DATA_AGENT_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "DATA_AGENT_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}

impl Config {
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    pub fn flow_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.flow_timeout)
    }

    /// Socket address string for the HTTP transport.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES_FILE.to_string(),
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            http_timeout: DEFAULT_HTTP_TIMEOUT_SECS,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            flows_dir: DEFAULT_FLOWS_DIR.to_string(),
            flow_interpreter: DEFAULT_FLOW_INTERPRETER.to_string(),
            flow_timeout: DEFAULT_FLOW_TIMEOUT_SECS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
