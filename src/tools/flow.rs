//! Flow script tools: save_flow, run_flow, and list_flows.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AgentResult;
use crate::flows::{FlowRun, FlowStore};

/// Input for the save_flow tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveFlowInput {
    /// Flow name; becomes the script file name. Letters, digits, '-' and '_' only.
    pub name: String,
    /// Python source of the flow. Must import prefect and define an @flow function.
    pub code: String,
}

/// Output from the save_flow tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SaveFlowOutput {
    pub name: String,
    /// Path the script was written to
    pub path: String,
}

/// Input for the run_flow tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunFlowInput {
    /// Name of a previously saved flow
    pub name: String,
}

/// Output from the list_flows tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListFlowsOutput {
    /// Names of all saved flows
    pub flows: Vec<String>,
}

/// Handler for flow script management.
pub struct FlowToolHandler {
    store: Arc<FlowStore>,
}

impl FlowToolHandler {
    pub fn new(store: Arc<FlowStore>) -> Self {
        Self { store }
    }

    /// Handle the save_flow tool call.
    pub async fn save_flow(&self, input: SaveFlowInput) -> AgentResult<SaveFlowOutput> {
        let path = self.store.save(&input.name, &input.code).await?;
        Ok(SaveFlowOutput {
            name: input.name,
            path: path.display().to_string(),
        })
    }

    /// Handle the run_flow tool call.
    pub async fn run_flow(&self, input: RunFlowInput) -> AgentResult<FlowRun> {
        self.store.run(&input.name).await
    }

    /// Handle the list_flows tool call.
    pub async fn list_flows(&self) -> AgentResult<ListFlowsOutput> {
        Ok(ListFlowsOutput {
            flows: self.store.list().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_save_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FlowStore::new(dir.path(), "python3", Duration::from_secs(60)));
        let handler = FlowToolHandler::new(store);

        let saved = handler
            .save_flow(SaveFlowInput {
                name: "nightly".to_string(),
                code: "from prefect import flow\n\n@flow\ndef nightly():\n    pass\n".to_string(),
            })
            .await
            .unwrap();
        assert!(saved.path.ends_with("nightly.py"));

        let listed = handler.list_flows().await.unwrap();
        assert_eq!(listed.flows, vec!["nightly".to_string()]);
    }
}
