//! Data models for the agent.

pub mod query;
pub mod source;

pub use query::{ColumnMetadata, QueryParam, QueryRequest, QueryResult};
pub use source::{CredentialKeys, SourceConfig, SourceKind, SourcesFile};
