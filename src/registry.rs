//! Source registry: loads the YAML data source catalog and manages lazy
//! database connection pools.
//!
//! The registry is loaded once at startup and is read-only afterwards. Pools
//! for database sources are opened on first use and cached for the life of
//! the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::db::pool::DbPool;
use crate::error::{AgentError, AgentResult};
use crate::models::source::{SourceConfig, SourceKind, SourcesFile};

/// Lightweight source description returned by list_sources (no secrets).
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
pub struct SourceSummary {
    /// Source identifier. Use this value in the source parameter of other tool calls.
    pub name: String,
    /// Source type: "postgres", "sqlite", "openapi", "json", or "file"
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Human description of what the source contains
    pub description: String,
    /// If true, DML/DDL statements are permitted against this source
    pub writable: bool,
}

#[derive(Debug)]
pub struct SourceRegistry {
    /// Insertion-ordered source names for stable listings
    order: Vec<String>,
    sources: HashMap<String, SourceConfig>,
    pools: RwLock<HashMap<String, DbPool>>,
}

impl SourceRegistry {
    /// Load the registry from a YAML file.
    pub async fn load(path: impl AsRef<Path>) -> AgentResult<Arc<Self>> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            AgentError::config(format!(
                "Cannot read data source file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let file: SourcesFile = serde_yaml::from_str(&contents).map_err(|e| {
            AgentError::config(format!("Invalid data source file '{}': {}", path.display(), e))
        })?;
        let registry = Self::from_sources(file.data_sources)?;
        info!(
            path = %path.display(),
            sources = registry.order.len(),
            "Loaded data source registry"
        );
        Ok(Arc::new(registry))
    }

    /// Build a registry from parsed source configs.
    pub fn from_sources(configs: Vec<SourceConfig>) -> AgentResult<Self> {
        let mut order = Vec::with_capacity(configs.len());
        let mut sources = HashMap::with_capacity(configs.len());
        for config in configs {
            config.validate()?;
            if sources.contains_key(&config.name) {
                return Err(AgentError::config(format!(
                    "Duplicate data source name '{}'",
                    config.name
                )));
            }
            order.push(config.name.clone());
            sources.insert(config.name.clone(), config);
        }
        Ok(Self {
            order,
            sources,
            pools: RwLock::new(HashMap::new()),
        })
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> AgentResult<&SourceConfig> {
        self.sources
            .get(name)
            .ok_or_else(|| AgentError::source_not_found(name, &self.order))
    }

    /// Look up a source, requiring it to be a database source.
    pub fn get_database(&self, name: &str) -> AgentResult<&SourceConfig> {
        let source = self.get(name)?;
        if !source.kind.is_database() {
            return Err(AgentError::kind_mismatch(
                name,
                "postgres or sqlite",
                source.kind.as_str(),
            ));
        }
        Ok(source)
    }

    /// Names of all configured sources in file order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of configured sources.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// List all sources with details.
    pub fn list_detail(&self) -> Vec<SourceSummary> {
        self.order
            .iter()
            .filter_map(|name| self.sources.get(name))
            .map(|source| SourceSummary {
                name: source.name.clone(),
                kind: source.kind,
                description: source.description.clone(),
                writable: source.writable,
            })
            .collect()
    }

    /// Render the source catalog as prompt-ready text.
    pub fn list_as_text(&self) -> String {
        if self.order.is_empty() {
            return "No data sources configured.".to_string();
        }
        let mut out = String::new();
        for name in &self.order {
            let Some(source) = self.sources.get(name) else {
                continue;
            };
            out.push_str(&format!(
                "- Name: {}\n  Type: {}\n  Description: {}\n",
                source.name, source.kind, source.description
            ));
        }
        out
    }

    /// Get the connection pool for a database source, opening it on first use.
    pub async fn pool(&self, name: &str) -> AgentResult<DbPool> {
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(name) {
                return Ok(pool.clone());
            }
        }

        let source = self.get_database(name)?;
        let pool = DbPool::connect(source).await?;

        // Re-check after the await in case a concurrent caller connected first
        let mut pools = self.pools.write().await;
        if let Some(existing) = pools.get(name) {
            let existing = existing.clone();
            drop(pools);
            pool.close().await;
            return Ok(existing);
        }
        pools.insert(name.to_string(), pool.clone());
        Ok(pool)
    }

    /// Close all open connection pools.
    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (name, pool) in pools.drain() {
            info!(source = %name, "Closing connection pool");
            pool.close().await;
        }
    }
}
