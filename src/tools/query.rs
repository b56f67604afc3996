//! SQL execution tool.
//!
//! This module implements the `run_sql` MCP tool. Reads run against any
//! database source; DML and DDL run only against sources configured as
//! writable, enforced by AST-level statement gating before anything touches
//! the database.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::db::QueryExecutor;
use crate::error::AgentResult;
use crate::models::query::{ColumnMetadata, MAX_ROW_LIMIT, QueryParam, QueryRequest, QueryResult};
use crate::registry::SourceRegistry;
use crate::tools::format::{self, OutputFormat};
use crate::tools::guard::{self, SqlAccess};

/// Input for the run_sql tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunSqlInput {
    /// Data source name from list_sources. Must be a postgres or sqlite source.
    pub source: String,
    /// SQL statement to execute. INSERT/UPDATE/DELETE/DDL require the source to be writable.
    pub sql: String,
    /// Positional parameters for parameterized queries (use $1,$2... or ? placeholders)
    #[serde(default)]
    pub params: Vec<QueryParamInput>,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Query timeout in seconds. Default: 30
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    /// Output format: "json" returns structured data, "table" an ASCII table, "markdown" a markdown table
    #[serde(default)]
    pub format: OutputFormat,
}

/// Input parameter that can be various JSON types.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamInput {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl From<QueryParamInput> for QueryParam {
    fn from(input: QueryParamInput) -> Self {
        match input {
            QueryParamInput::Null => QueryParam::Null,
            QueryParamInput::Bool(v) => QueryParam::Bool(v),
            QueryParamInput::Int(v) => QueryParam::Int(v),
            QueryParamInput::Float(v) => QueryParam::Float(v),
            QueryParamInput::String(v) => QueryParam::String(v),
        }
    }
}

/// Output from the run_sql tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunSqlOutput {
    /// Column metadata (name, type, nullable). Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnMetadataOutput>,
    /// Result rows as key-value maps. Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Pre-formatted output when format is table or markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Rows affected, for write statements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    /// True if the result was truncated due to the row limit
    pub truncated: bool,
    /// Number of rows returned
    pub row_count: usize,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
    /// Warning message if any issues occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnMetadataOutput {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

impl From<ColumnMetadata> for ColumnMetadataOutput {
    fn from(meta: ColumnMetadata) -> Self {
        Self {
            name: meta.name,
            type_name: meta.type_name,
            nullable: meta.nullable,
        }
    }
}

impl RunSqlOutput {
    fn from_result(result: QueryResult, output_format: OutputFormat, warning: Option<String>) -> Self {
        let row_count = result.rows.len();
        let truncated = result.truncated;
        let rows_affected = result.rows_affected;
        let execution_time_ms = result.execution_time_ms;

        match output_format {
            OutputFormat::Json => Self {
                columns: result.columns.into_iter().map(Into::into).collect(),
                rows: result.rows,
                formatted: None,
                rows_affected,
                truncated,
                row_count,
                execution_time_ms,
                warning,
            },
            OutputFormat::Table => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format::format_as_table(&result)),
                rows_affected,
                truncated,
                row_count,
                execution_time_ms,
                warning,
            },
            OutputFormat::Markdown => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format::format_as_markdown(&result)),
                rows_affected,
                truncated,
                row_count,
                execution_time_ms,
                warning,
            },
        }
    }
}

/// Handler for SQL execution.
pub struct QueryToolHandler {
    registry: Arc<SourceRegistry>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            executor: QueryExecutor::new(),
        }
    }

    pub fn with_executor(registry: Arc<SourceRegistry>, executor: QueryExecutor) -> Self {
        Self { registry, executor }
    }

    /// Handle the run_sql tool call.
    pub async fn run_sql(&self, input: RunSqlInput) -> AgentResult<RunSqlOutput> {
        let source = self.registry.get_database(&input.source)?;
        let access = guard::ensure_allowed(&input.sql, source.kind, source.writable)?;

        // An over-limit request is capped with a warning, not an error
        let limit_warning = input.limit.and_then(|requested| {
            (requested > MAX_ROW_LIMIT).then(|| {
                format!(
                    "Requested limit {} exceeds maximum allowed ({}). Results capped to {} rows.",
                    requested, MAX_ROW_LIMIT, MAX_ROW_LIMIT
                )
            })
        });

        let pool = self.registry.pool(&input.source).await?;
        let params: Vec<QueryParam> = input.params.into_iter().map(Into::into).collect();

        let result = match access {
            SqlAccess::Read => {
                let request = QueryRequest {
                    source: input.source.clone(),
                    sql: input.sql.clone(),
                    params,
                    limit: input.limit,
                    timeout_secs: input.timeout_secs,
                };
                self.executor.execute_query(&pool, &request).await?
            }
            SqlAccess::Write => {
                let (rows_affected, execution_time_ms) = self
                    .executor
                    .execute_write(&pool, &input.sql, &params, input.timeout_secs)
                    .await?;
                QueryResult::write_result(rows_affected, execution_time_ms)
            }
        };

        info!(
            source = %input.source,
            row_count = result.rows.len(),
            rows_affected = ?result.rows_affected,
            truncated = result.truncated,
            execution_time_ms = result.execution_time_ms,
            "SQL executed"
        );

        Ok(RunSqlOutput::from_result(result, input.format, limit_warning))
    }
}
