//! Error types for the data source agent.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Each error variant provides actionable messages to help AI
//! assistants understand and recover from error conditions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Data source '{name}' not found. Available sources: {available}")]
    SourceNotFound { name: String, available: String },

    #[error("Data source '{name}' is a '{actual}' source, expected '{expected}'")]
    SourceKindMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Missing environment variables for data source '{name}': {missing:?}")]
    Credentials { name: String, missing: Vec<String> },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Flow error: {message}")]
    Flow { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AgentError {
    /// Create a source-not-found error listing the configured source names.
    pub fn source_not_found(name: impl Into<String>, available: &[String]) -> Self {
        let available = if available.is_empty() {
            "(none configured)".to_string()
        } else {
            available.join(", ")
        };
        Self::SourceNotFound {
            name: name.into(),
            available,
        }
    }

    /// Create a source kind mismatch error.
    pub fn kind_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::SourceKindMismatch {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a permission error.
    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a flow error.
    pub fn flow(message: impl Into<String>) -> Self {
        Self::Flow {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

}

/// Convert sqlx errors to AgentError.
impl From<sqlx::Error> for AgentError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AgentError::connection(
                msg.to_string(),
                "Check the connection parameters and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AgentError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => AgentError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => AgentError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                AgentError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => AgentError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AgentError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => AgentError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                AgentError::database(format!("Column not found: {}", col), None, col)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => AgentError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                AgentError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AgentError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => AgentError::internal("Database worker crashed"),
            _ => AgentError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Convert reqwest errors to AgentError.
impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentError::timeout("HTTP request", 30)
        } else if err.is_connect() {
            AgentError::connection(
                format!("Failed to reach endpoint: {}", err),
                "Check that the API server is running and the base_url is correct",
            )
        } else {
            AgentError::http(err.to_string())
        }
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert AgentError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<AgentError> for rmcp::ErrorData {
    fn from(err: AgentError) -> Self {
        match &err {
            AgentError::SourceNotFound { .. } => rmcp::ErrorData::resource_not_found(
                err.to_string(),
                suggestion_data(Some("Call list_sources to see the configured sources")),
            ),

            AgentError::SourceKindMismatch { .. }
            | AgentError::InvalidInput { .. }
            | AgentError::Permission { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), suggestion_data(err.suggestion()))
            }

            AgentError::Credentials { .. } => rmcp::ErrorData::invalid_params(
                err.to_string(),
                suggestion_data(Some(
                    "Set the listed environment variables (or add them to the .env file)",
                )),
            ),

            AgentError::Database {
                message,
                sql_state,
                suggestion,
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, suggestion_data(Some(suggestion)))
            }

            AgentError::Connection { suggestion, .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(Some(suggestion)))
            }

            AgentError::Timeout { .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                suggestion_data(Some(
                    "Consider increasing the timeout or simplifying the operation",
                )),
            ),

            AgentError::Http { .. } | AgentError::Flow { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }

            AgentError::Config { .. } | AgentError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_source_not_found_lists_available() {
        let err = AgentError::source_not_found(
            "missing",
            &["bank_db".to_string(), "local_orders".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("missing"));
        assert!(msg.contains("bank_db"));
        assert!(msg.contains("local_orders"));
    }

    #[test]
    fn test_source_not_found_empty_registry() {
        let err = AgentError::source_not_found("x", &[]);
        assert!(err.to_string().contains("none configured"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = AgentError::database(
            "Syntax error",
            Some("42601".to_string()),
            "Check SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check SQL syntax"));
    }

    #[test]
    fn test_source_not_found_maps_to_resource_not_found() {
        let err = AgentError::source_not_found("db1", &[]);
        let mcp_err: rmcp::ErrorData = err.into();
        // resource_not_found uses -32002 in rmcp
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_permission_maps_to_invalid_params() {
        let err = AgentError::permission("INSERT", "source is read-only");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_kind_mismatch_maps_to_invalid_params() {
        let err = AgentError::kind_mismatch("files", "postgres", "file");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_timeout_maps_to_internal_error() {
        let err = AgentError::timeout("query", 30);
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_database_error_includes_sql_state() {
        let err = AgentError::database("syntax error", Some("42601".to_string()), "check syntax");
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.message.contains("42601"));
    }

    #[test]
    fn test_credentials_error_includes_hint_in_data() {
        let err = AgentError::Credentials {
            name: "bank_db".to_string(),
            missing: vec!["BANK_DB_HOST".to_string()],
        };
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.data.is_some());
        let data = mcp_err.data.unwrap();
        assert!(data["suggestion"].as_str().unwrap().contains("environment"));
    }
}
