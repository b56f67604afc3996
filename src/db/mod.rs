//! Database layer: connection pools, query execution, type decoding, and
//! schema introspection for Postgres and SQLite sources.

pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::DbPool;
pub use schema::SchemaInspector;
