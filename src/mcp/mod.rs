//! MCP protocol layer.

pub mod service;

pub use service::AgentService;
