//! File and JSON source tool.
//!
//! Implements `read_source` for file and json sources. The source location
//! may be a local path or an http(s) URL; json sources are parsed and
//! pretty-printed so the model sees well-formed structure.

use std::sync::Arc;

use humansize::{DECIMAL, format_size};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AgentError, AgentResult};
use crate::models::source::SourceKind;
use crate::registry::SourceRegistry;

/// Input for the read_source tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadSourceInput {
    /// Data source name from list_sources. Must be a file or json source.
    pub source: String,
}

/// Output from the read_source tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReadSourceOutput {
    pub source: String,
    /// File content; pretty-printed when the source is json
    pub content: String,
    /// Size of the full document before any truncation, e.g. "4.2 kB"
    pub size: String,
    /// True if the content was cut off at the configured byte cap
    pub truncated: bool,
}

/// Handler for file and json sources.
pub struct FileToolHandler {
    registry: Arc<SourceRegistry>,
    client: reqwest::Client,
    max_bytes: u64,
}

impl FileToolHandler {
    pub fn new(registry: Arc<SourceRegistry>, client: reqwest::Client, max_bytes: u64) -> Self {
        Self {
            registry,
            client,
            max_bytes,
        }
    }

    /// Handle the read_source tool call.
    pub async fn read_source(&self, input: ReadSourceInput) -> AgentResult<ReadSourceOutput> {
        let source = self.registry.get(&input.source)?;
        let path = match source.kind {
            SourceKind::File | SourceKind::Json => source.path.as_deref().ok_or_else(|| {
                AgentError::config(format!("source '{}' has no path", source.name))
            })?,
            other => {
                return Err(AgentError::kind_mismatch(
                    &input.source,
                    "file or json",
                    other.as_str(),
                ));
            }
        };

        let raw = self.fetch(path).await?;
        let total_bytes = raw.len() as u64;

        let mut content = if source.kind == SourceKind::Json {
            let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                AgentError::invalid_input(format!(
                    "Source '{}' does not contain valid JSON: {}",
                    input.source, e
                ))
            })?;
            serde_json::to_string_pretty(&value)
                .map_err(|e| AgentError::internal(format!("Failed to render JSON: {}", e)))?
        } else {
            raw
        };

        let truncated = content.len() as u64 > self.max_bytes;
        if truncated {
            let mut cut = self.max_bytes as usize;
            // cut on a char boundary
            while cut > 0 && !content.is_char_boundary(cut) {
                cut -= 1;
            }
            content.truncate(cut);
        }

        info!(
            source = %input.source,
            bytes = total_bytes,
            truncated,
            "Read file source"
        );

        Ok(ReadSourceOutput {
            source: input.source,
            content,
            size: format_size(total_bytes, DECIMAL),
            truncated,
        })
    }

    /// Fetch content from disk or, for http(s) locations, over the network.
    async fn fetch(&self, path: &str) -> AgentResult<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let response = self.client.get(path).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AgentError::http(format!(
                    "Request to {} returned {}",
                    path, status
                )));
            }
            Ok(response.text().await?)
        } else {
            tokio::fs::read_to_string(path).await.map_err(|e| {
                AgentError::invalid_input(format!("Cannot read file '{}': {}", path, e))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::source::SourceConfig;

    fn make_registry(kind: SourceKind, path: &str) -> Arc<SourceRegistry> {
        let source = SourceConfig {
            name: "doc".to_string(),
            kind,
            description: String::new(),
            credentials: None,
            path: Some(path.to_string()),
            base_url: None,
            spec_url: None,
            writable: false,
            ignore_tables: Vec::new(),
        };
        Arc::new(SourceRegistry::from_sources(vec![source]).unwrap())
    }

    fn handler(registry: Arc<SourceRegistry>, max_bytes: u64) -> FileToolHandler {
        FileToolHandler::new(registry, reqwest::Client::new(), max_bytes)
    }

    #[tokio::test]
    async fn test_read_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "hello from disk").await.unwrap();

        let handler = handler(make_registry(SourceKind::File, path.to_str().unwrap()), 1024);
        let output = handler
            .read_source(ReadSourceInput {
                source: "doc".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output.content, "hello from disk");
        assert!(!output.truncated);
    }

    #[tokio::test]
    async fn test_json_source_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        tokio::fs::write(&path, r#"{"a":[1,2]}"#).await.unwrap();

        let handler = handler(make_registry(SourceKind::Json, path.to_str().unwrap()), 1024);
        let output = handler
            .read_source(ReadSourceInput {
                source: "doc".to_string(),
            })
            .await
            .unwrap();
        assert!(output.content.contains("\"a\": [\n"));
    }

    #[tokio::test]
    async fn test_json_source_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let handler = handler(make_registry(SourceKind::Json, path.to_str().unwrap()), 1024);
        let result = handler
            .read_source(ReadSourceInput {
                source: "doc".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_large_file_truncated_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        tokio::fs::write(&path, "x".repeat(100)).await.unwrap();

        let handler = handler(make_registry(SourceKind::File, path.to_str().unwrap()), 10);
        let output = handler
            .read_source(ReadSourceInput {
                source: "doc".to_string(),
            })
            .await
            .unwrap();
        assert!(output.truncated);
        assert_eq!(output.content.len(), 10);
        assert_eq!(output.size, "100 B");
    }
}
