//! Source catalog tools: list_sources and get_credentials.
//!
//! get_credentials reports the environment variable NAMES a source expects
//! and whether each is currently set. Credential values never leave the
//! process.

use std::env;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};
use crate::models::source::SourceKind;
use crate::registry::{SourceRegistry, SourceSummary};

/// Output from the list_sources tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSourcesOutput {
    /// Structured source catalog
    pub sources: Vec<SourceSummary>,
    /// The same catalog rendered as prompt-ready text
    pub text: String,
}

/// Input for the get_credentials tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCredentialsInput {
    /// Data source name from list_sources
    pub source: String,
}

/// One credential environment variable and its status.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CredentialStatus {
    /// What the variable configures: "host", "port", "dbname", "user", or "password"
    pub field: String,
    /// Environment variable name holding the value
    pub env_var: String,
    /// Whether the variable is currently set to a non-empty value
    pub is_set: bool,
}

/// Output from the get_credentials tool. Values are never included.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetCredentialsOutput {
    pub source: String,
    pub credentials: Vec<CredentialStatus>,
}

/// Handler for the source catalog tools.
pub struct SourcesToolHandler {
    registry: Arc<SourceRegistry>,
}

impl SourcesToolHandler {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Handle the list_sources tool call.
    pub fn list_sources(&self) -> ListSourcesOutput {
        ListSourcesOutput {
            sources: self.registry.list_detail(),
            text: self.registry.list_as_text(),
        }
    }

    /// Handle the get_credentials tool call.
    pub fn get_credentials(&self, input: GetCredentialsInput) -> AgentResult<GetCredentialsOutput> {
        let source = self.registry.get(&input.source)?;
        if source.kind != SourceKind::Postgres {
            return Err(AgentError::invalid_input(format!(
                "Source '{}' is a '{}' source and has no credential environment variables",
                source.name, source.kind
            )));
        }
        let keys = source.credentials.as_ref().ok_or_else(|| {
            AgentError::config(format!(
                "postgres source '{}' has no credentials configured",
                source.name
            ))
        })?;

        let credentials = keys
            .entries()
            .into_iter()
            .map(|(field, var)| CredentialStatus {
                field: field.to_string(),
                env_var: var.to_string(),
                is_set: env::var(var).map(|v| !v.is_empty()).unwrap_or(false),
            })
            .collect();

        Ok(GetCredentialsOutput {
            source: input.source,
            credentials,
        })
    }
}
