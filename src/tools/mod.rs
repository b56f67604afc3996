//! Tool implementations exposed over MCP.
//!
//! Each tool lives in its own module with a handler struct plus input/output
//! types. The MCP service layer (`crate::mcp`) wires these handlers to the
//! protocol.

pub mod api;
pub mod file;
pub mod flow;
pub mod format;
pub mod guard;
pub mod query;
pub mod schema;
pub mod sources;

pub use api::ApiToolHandler;
pub use file::FileToolHandler;
pub use flow::FlowToolHandler;
pub use query::QueryToolHandler;
pub use schema::SchemaToolHandler;
pub use sources::SourcesToolHandler;
