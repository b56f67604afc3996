//! Connection pool creation for database sources.
//!
//! Pools are database-specific (PgPool, SqlitePool) to ensure full type
//! support. They are created lazily by the source registry the first time a
//! database source is used, then cached for the life of the process.

use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    PgPool, SqlitePool, postgres::PgPoolOptions, sqlite::SqliteConnectOptions,
    sqlite::SqlitePoolOptions,
};
use tracing::{debug, warn};

use crate::error::{AgentError, AgentResult};
use crate::models::source::{SourceConfig, SourceKind};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Database-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Open a pool for a database source.
    pub async fn connect(source: &SourceConfig) -> AgentResult<Self> {
        let pool = match source.kind {
            SourceKind::Postgres => {
                // connection URL is resolved from env vars, never logged
                let url = source.postgres_url()?;
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .idle_timeout(IDLE_TIMEOUT)
                    .connect(&url)
                    .await
                    .map_err(|e| {
                        AgentError::connection(
                            format!("Failed to connect to '{}': {}", source.name, e),
                            connection_suggestion(source.kind, &e),
                        )
                    })?;
                DbPool::Postgres(pool)
            }
            SourceKind::Sqlite => {
                let path = source.path.as_deref().ok_or_else(|| {
                    AgentError::config(format!("sqlite source '{}' has no path", source.name))
                })?;
                let mut options =
                    SqliteConnectOptions::from_str(&format!("sqlite:{path}")).map_err(|e| {
                        AgentError::connection(
                            format!("Invalid SQLite path '{}': {}", path, e),
                            "Check the 'path' entry for this source",
                        )
                    })?;
                if source.writable {
                    options = options.create_if_missing(true).read_only(false);
                } else {
                    options = options.read_only(true);
                }
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_with(options)
                    .await
                    .map_err(|e| {
                        AgentError::connection(
                            format!("Failed to open '{}': {}", source.name, e),
                            connection_suggestion(source.kind, &e),
                        )
                    })?;
                DbPool::SQLite(pool)
            }
            other => {
                return Err(AgentError::kind_mismatch(
                    &source.name,
                    "postgres or sqlite",
                    other.as_str(),
                ));
            }
        };

        if let Some(version) = pool.server_version().await {
            debug!(source = %source.name, version = %version, "Connected to database");
        }
        Ok(pool)
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
        }
    }

    /// Get the database kind for this pool.
    pub fn kind(&self) -> SourceKind {
        match self {
            DbPool::Postgres(_) => SourceKind::Postgres,
            DbPool::SQLite(_) => SourceKind::Sqlite,
        }
    }

    /// Get the server version from the connected database.
    async fn server_version(&self) -> Option<String> {
        let result = match self {
            DbPool::Postgres(pool) => {
                sqlx::query_scalar::<_, String>("SELECT version()")
                    .fetch_one(pool)
                    .await
            }
            DbPool::SQLite(pool) => {
                sqlx::query_scalar::<_, String>("SELECT sqlite_version()")
                    .fetch_one(pool)
                    .await
            }
        };
        match result {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(kind: SourceKind, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!("Check that the {} server is running and accessible", kind);
    }

    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify the credential environment variables for this source".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unable to open") {
        return "Check that the database exists at the configured location".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    match kind {
        SourceKind::Postgres => {
            "Verify the host, port, dbname, user, and password environment variables".to_string()
        }
        _ => "Verify the file path exists and is accessible".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_source(path: &str, writable: bool) -> SourceConfig {
        SourceConfig {
            name: "test_db".to_string(),
            kind: SourceKind::Sqlite,
            description: String::new(),
            credentials: None,
            path: Some(path.to_string()),
            base_url: None,
            spec_url: None,
            writable,
            ignore_tables: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_writable_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.db");
        let source = sqlite_source(path.to_str().unwrap(), true);
        let pool = DbPool::connect(&source).await.unwrap();
        assert_eq!(pool.kind(), SourceKind::Sqlite);
        pool.close().await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_sqlite_readonly_missing_file_fails() {
        let source = sqlite_source("/nonexistent/path/missing.db", false);
        let result = DbPool::connect(&source).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_database_source_rejected() {
        let source = SourceConfig {
            name: "api".to_string(),
            kind: SourceKind::Openapi,
            description: String::new(),
            credentials: None,
            path: None,
            base_url: Some("http://localhost:8001".to_string()),
            spec_url: None,
            writable: false,
            ignore_tables: Vec::new(),
        };
        let result = DbPool::connect(&source).await;
        assert!(matches!(
            result,
            Err(AgentError::SourceKindMismatch { .. })
        ));
    }
}
