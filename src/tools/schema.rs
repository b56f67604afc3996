//! Schema inspection tool.
//!
//! Implements the `get_schema` MCP tool: renders a database source's schema
//! (and optionally sample rows) as text sized for a model prompt.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::SchemaInspector;
use crate::error::AgentResult;
use crate::registry::SourceRegistry;

/// Input for the get_schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSchemaInput {
    /// Data source name from list_sources. Must be a postgres or sqlite source.
    pub source: String,
    /// Include sample rows from each table (default: true)
    #[serde(default = "default_include_samples")]
    pub include_samples: bool,
    /// Sample rows per table. Default: 10
    #[serde(default)]
    pub sample_limit: Option<u32>,
}

fn default_include_samples() -> bool {
    true
}

/// Output from the get_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetSchemaOutput {
    /// Source the schema belongs to
    pub source: String,
    /// Schema and sample rows concatenated into one prompt-ready string
    pub context: String,
    /// Schema rendered as text (tables, columns, types)
    pub schema: String,
    /// Sample rows rendered as text, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<String>,
    /// Names of the introspected tables
    pub tables: Vec<String>,
}

/// Handler for schema inspection.
pub struct SchemaToolHandler {
    registry: Arc<SourceRegistry>,
    default_sample_limit: u32,
}

impl SchemaToolHandler {
    pub fn new(registry: Arc<SourceRegistry>, default_sample_limit: u32) -> Self {
        Self {
            registry,
            default_sample_limit,
        }
    }

    /// Handle the get_schema tool call.
    pub async fn get_schema(&self, input: GetSchemaInput) -> AgentResult<GetSchemaOutput> {
        let source = self.registry.get_database(&input.source)?;
        let ignore = source.ignore_tables.clone();
        let pool = self.registry.pool(&input.source).await?;

        let schema = SchemaInspector::schema_text(&pool, &ignore).await?;
        let tables = SchemaInspector::list_tables(&pool, &ignore).await?;

        let samples = if input.include_samples {
            let limit = input.sample_limit.unwrap_or(self.default_sample_limit).max(1);
            Some(SchemaInspector::table_samples_text(&pool, &ignore, limit).await?)
        } else {
            None
        };

        info!(
            source = %input.source,
            tables = tables.len(),
            with_samples = input.include_samples,
            "Schema inspected"
        );

        let context = match &samples {
            Some(samples) => format!("{schema}\n{samples}"),
            None => schema.clone(),
        };

        Ok(GetSchemaOutput {
            source: input.source,
            context,
            schema,
            samples,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let input: GetSchemaInput = serde_json::from_str(r#"{"source": "bank_db"}"#).unwrap();
        assert!(input.include_samples);
        assert_eq!(input.sample_limit, None);
    }

    #[test]
    fn test_input_disable_samples() {
        let input: GetSchemaInput =
            serde_json::from_str(r#"{"source": "bank_db", "include_samples": false}"#).unwrap();
        assert!(!input.include_samples);
    }
}
