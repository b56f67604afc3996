//! MCP service implementation using rmcp.
//!
//! This module defines the AgentService struct with all data source tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use std::sync::Arc;

use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::api::{ApiClient, ApiResponse};
use crate::config::Config;
use crate::db::QueryExecutor;
use crate::error::{AgentError, AgentResult};
use crate::models::query::DEFAULT_ROW_LIMIT;
use crate::flows::{FlowRun, FlowStore};
use crate::registry::SourceRegistry;
use crate::tools::api::{ApiToolHandler, CallApiInput, GetApiSchemaInput, GetApiSchemaOutput};
use crate::tools::file::{FileToolHandler, ReadSourceInput, ReadSourceOutput};
use crate::tools::flow::{
    FlowToolHandler, ListFlowsOutput, RunFlowInput, SaveFlowInput, SaveFlowOutput,
};
use crate::tools::query::{QueryToolHandler, RunSqlInput, RunSqlOutput};
use crate::tools::schema::{GetSchemaInput, GetSchemaOutput, SchemaToolHandler};
use crate::tools::sources::{
    GetCredentialsInput, GetCredentialsOutput, ListSourcesOutput, SourcesToolHandler,
};

#[derive(Clone)]
pub struct AgentService {
    /// Shared source registry (configs plus cached database pools)
    registry: Arc<SourceRegistry>,
    /// Shared HTTP client for openapi sources
    api_client: ApiClient,
    /// Shared HTTP client for remote file sources
    file_client: reqwest::Client,
    /// Shared flow script store
    flow_store: Arc<FlowStore>,
    /// Default sample rows per table for get_schema
    sample_limit: u32,
    /// Default SQL query timeout in seconds
    query_timeout: u64,
    /// Byte cap for read_source content
    max_file_bytes: u64,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl AgentService {
    /// Build the service from runtime configuration and a loaded registry.
    pub fn new(config: &Config, registry: Arc<SourceRegistry>) -> AgentResult<Self> {
        let api_client = ApiClient::new(config.http_timeout_duration())?;
        let file_client = reqwest::Client::builder()
            .timeout(config.http_timeout_duration())
            .build()
            .map_err(|e| AgentError::internal(format!("Failed to build HTTP client: {}", e)))?;
        let flow_store = Arc::new(FlowStore::new(
            &config.flows_dir,
            &config.flow_interpreter,
            config.flow_timeout_duration(),
        ));
        Ok(Self {
            registry,
            api_client,
            file_client,
            flow_store,
            sample_limit: config.sample_limit,
            query_timeout: config.query_timeout,
            max_file_bytes: config.max_file_bytes,
            tool_router: Self::tool_router(),
        })
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Validate a source name: non-empty after trimming.
    fn validate_source_name(&self, provided: &str) -> Result<String, McpError> {
        let trimmed = provided.trim();
        if trimmed.is_empty() {
            Err(McpError::invalid_params(
                "source is required. Call list_sources first to see the configured data sources.",
                None,
            ))
        } else {
            Ok(trimmed.to_string())
        }
    }
}

#[tool_router]
impl AgentService {
    #[tool(
        description = "List all configured data sources.\nReturns each source's name, type (postgres/sqlite/openapi/json/file), description, and whether it accepts writes."
    )]
    async fn list_sources(&self) -> Json<ListSourcesOutput> {
        let handler = SourcesToolHandler::new(self.registry.clone());
        Json(handler.list_sources())
    }

    #[tool(
        description = "Get the schema of a database source, optionally with sample rows from each table.\nUse this to understand a source's structure before writing SQL against it."
    )]
    async fn get_schema(
        &self,
        Parameters(input): Parameters<GetSchemaInput>,
    ) -> Result<Json<GetSchemaOutput>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let handler = SchemaToolHandler::new(self.registry.clone(), self.sample_limit);
        handler.get_schema(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Execute SQL against a postgres or sqlite source.\nSupports parameterized queries to prevent SQL injection.\nSELECT always works; INSERT/UPDATE/DELETE/DDL require the source to be configured writable.\nOutput format: json (default), table, or markdown."
    )]
    async fn run_sql(
        &self,
        Parameters(input): Parameters<RunSqlInput>,
    ) -> Result<Json<RunSqlOutput>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let executor = QueryExecutor::with_defaults(self.query_timeout, DEFAULT_ROW_LIMIT);
        let handler = QueryToolHandler::with_executor(self.registry.clone(), executor);
        handler.run_sql(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Fetch the OpenAPI document for an openapi source.\nUse this to discover the endpoints available before calling call_api."
    )]
    async fn get_api_schema(
        &self,
        Parameters(input): Parameters<GetApiSchemaInput>,
    ) -> Result<Json<GetApiSchemaOutput>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let handler = ApiToolHandler::new(self.registry.clone(), self.api_client.clone());
        handler
            .get_api_schema(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Call an endpoint of an openapi source.\nThe endpoint path is joined to the source's base URL. Returns the HTTP status and response body; non-2xx statuses are returned, not raised."
    )]
    async fn call_api(
        &self,
        Parameters(input): Parameters<CallApiInput>,
    ) -> Result<Json<ApiResponse>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let handler = ApiToolHandler::new(self.registry.clone(), self.api_client.clone());
        handler.call_api(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Read the content of a file or json source.\nJSON sources are parsed and pretty-printed. Large content is truncated at a configured byte cap."
    )]
    async fn read_source(
        &self,
        Parameters(input): Parameters<ReadSourceInput>,
    ) -> Result<Json<ReadSourceOutput>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let handler = FileToolHandler::new(
            self.registry.clone(),
            self.file_client.clone(),
            self.max_file_bytes,
        );
        handler.read_source(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Get the credential environment variable names for a postgres source and whether each is set.\nValues are never returned. Use this to diagnose connection failures."
    )]
    async fn get_credentials(
        &self,
        Parameters(input): Parameters<GetCredentialsInput>,
    ) -> Result<Json<GetCredentialsOutput>, McpError> {
        let mut input = input;
        input.source = self.validate_source_name(&input.source)?;
        let handler = SourcesToolHandler::new(self.registry.clone());
        handler.get_credentials(input).map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Save a Prefect flow script for later execution.\nThe code must import prefect and define at least one function decorated with @flow."
    )]
    async fn save_flow(
        &self,
        Parameters(input): Parameters<SaveFlowInput>,
    ) -> Result<Json<SaveFlowOutput>, McpError> {
        let handler = FlowToolHandler::new(self.flow_store.clone());
        handler.save_flow(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Run a previously saved flow script with the configured Python interpreter.\nReturns the exit code, captured stdout/stderr, and wall-clock duration."
    )]
    async fn run_flow(
        &self,
        Parameters(input): Parameters<RunFlowInput>,
    ) -> Result<Json<FlowRun>, McpError> {
        let handler = FlowToolHandler::new(self.flow_store.clone());
        handler.run_flow(input).await.map(Json).map_err(McpError::from)
    }

    #[tool(description = "List the names of all saved flow scripts.")]
    async fn list_flows(&self) -> Result<Json<ListFlowsOutput>, McpError> {
        let handler = FlowToolHandler::new(self.flow_store.clone());
        handler.list_flows().await.map(Json).map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for AgentService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "data-source-agent".to_owned(),
                title: Some("Data Source Agent".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for discovering, inspecting, and querying configured data sources:\n\
                SQL databases (postgres, sqlite), REST APIs described by OpenAPI, and\n\
                file/JSON documents.\n\
                \n\
                ## Workflow\n\
                1. Analyze the user's request to understand what data is needed\n\
                2. Call `list_sources` to discover the configured sources\n\
                3. Select the single most promising source and inspect it:\n\
                   `get_schema` for databases, `get_api_schema` for APIs,\n\
                   `read_source` for files\n\
                4. Formulate a concrete retrieval plan from what you learned\n\
                5. Execute it with `run_sql` or `call_api`\n\
                \n\
                ## Source Types\n\
                - **postgres / sqlite**: Use `get_schema` then `run_sql`. Writes require\n\
                  the source to be configured writable; read-only sources reject\n\
                  INSERT/UPDATE/DELETE/DDL\n\
                - **openapi**: Use `get_api_schema` then `call_api`\n\
                - **json / file**: Use `read_source`\n\
                \n\
                ## Connection Problems\n\
                Postgres connections resolve credentials from environment variables.\n\
                If a connection fails, call `get_credentials` to see which variables\n\
                the source expects and which are unset.\n\
                \n\
                ## Saved Flows\n\
                Use `save_flow` to persist a Prefect pipeline script and `run_flow`\n\
                to execute it. `list_flows` shows what has been saved."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> AgentService {
        let registry = Arc::new(SourceRegistry::from_sources(Vec::new()).unwrap());
        AgentService::new(&Config::default(), registry).unwrap()
    }

    #[test]
    fn test_service_creation() {
        let _service = create_test_service();
    }

    #[test]
    fn test_validate_source_name_trims() {
        let service = create_test_service();
        assert_eq!(service.validate_source_name("  bank_db  ").unwrap(), "bank_db");
    }

    #[test]
    fn test_validate_source_name_rejects_empty() {
        let service = create_test_service();
        let err = service.validate_source_name("   ").unwrap_err();
        assert!(err.message.contains("source is required"));
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "data-source-agent");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }
}
