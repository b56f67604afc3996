//! REST API tools: get_api_schema and call_api.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiClient, ApiResponse};
use crate::error::AgentResult;
use crate::registry::SourceRegistry;

/// Input for the get_api_schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetApiSchemaInput {
    /// Data source name from list_sources. Must be an openapi source.
    pub source: String,
}

/// Output from the get_api_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetApiSchemaOutput {
    pub source: String,
    /// The source's OpenAPI document
    pub spec: serde_json::Value,
}

/// Input for the call_api tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CallApiInput {
    /// Data source name from list_sources. Must be an openapi source.
    pub source: String,
    /// Endpoint path relative to the source's base URL, e.g. "/users/1/transactions"
    pub endpoint: String,
    /// HTTP method: GET, POST, PUT, PATCH, or DELETE. Default: GET
    #[serde(default = "default_method")]
    pub method: String,
    /// JSON request body, for methods that take one
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Handler for REST API sources.
pub struct ApiToolHandler {
    registry: Arc<SourceRegistry>,
    client: ApiClient,
}

impl ApiToolHandler {
    pub fn new(registry: Arc<SourceRegistry>, client: ApiClient) -> Self {
        Self { registry, client }
    }

    /// Handle the get_api_schema tool call.
    pub async fn get_api_schema(&self, input: GetApiSchemaInput) -> AgentResult<GetApiSchemaOutput> {
        let source = self.registry.get(&input.source)?;
        let spec = self.client.fetch_spec(source).await?;
        info!(source = %input.source, "Fetched API schema");
        Ok(GetApiSchemaOutput {
            source: input.source,
            spec,
        })
    }

    /// Handle the call_api tool call.
    pub async fn call_api(&self, input: CallApiInput) -> AgentResult<ApiResponse> {
        let source = self.registry.get(&input.source)?;
        let response = self
            .client
            .request(source, &input.method, &input.endpoint, input.body)
            .await?;
        info!(
            source = %input.source,
            method = %input.method,
            endpoint = %input.endpoint,
            status = response.status,
            "API call completed"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_api_input_defaults_to_get() {
        let input: CallApiInput =
            serde_json::from_str(r#"{"source": "payments_api", "endpoint": "/users"}"#).unwrap();
        assert_eq!(input.method, "GET");
        assert!(input.body.is_none());
    }
}
