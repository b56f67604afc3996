//! Data Source Agent Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to discover, inspect, and query configured data sources: PostgreSQL and
//! SQLite databases, OpenAPI services, and file/JSON documents.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod flows;
pub mod mcp;
pub mod models;
pub mod registry;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::AgentError;
pub use mcp::AgentService;
pub use registry::SourceRegistry;
