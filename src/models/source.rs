//! Data source registry models.
//!
//! The registry file is a YAML document with a top-level `data_sources` list.
//! Database sources reference credentials indirectly through environment
//! variable names so the registry file itself never holds secrets.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};

/// The kind of a configured data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// PostgreSQL database
    Postgres,
    /// SQLite database file
    Sqlite,
    /// REST API described by an OpenAPI document
    Openapi,
    /// JSON document on disk or over HTTP
    Json,
    /// Plain file on disk or over HTTP
    File,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::Openapi => "openapi",
            Self::Json => "json",
            Self::File => "file",
        }
    }

    /// Whether this kind of source is backed by a SQL database.
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Postgres | Self::Sqlite)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment variable names holding the connection credentials for a
/// Postgres source. The values are resolved at connect time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialKeys {
    pub host_env: String,
    pub port_env: String,
    pub dbname_env: String,
    pub user_env: String,
    pub password_env: String,
}

impl CredentialKeys {
    /// All (label, env var name) pairs in a stable order.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("host", &self.host_env),
            ("port", &self.port_env),
            ("dbname", &self.dbname_env),
            ("user", &self.user_env),
            ("password", &self.password_env),
        ]
    }
}

/// A single configured data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub description: String,
    /// Env var indirection for postgres credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialKeys>,
    /// Filesystem path for sqlite / json / file sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base URL for openapi sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// URL of the OpenAPI document when it is not at <base_url>/openapi.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<String>,
    /// Whether DML/DDL statements are permitted against this source
    #[serde(default)]
    pub writable: bool,
    /// Tables excluded from schema introspection and sampling
    #[serde(default)]
    pub ignore_tables: Vec<String>,
}

impl SourceConfig {
    /// Validate that the fields required by this source's kind are present.
    pub fn validate(&self) -> AgentResult<()> {
        match self.kind {
            SourceKind::Postgres => {
                if self.credentials.is_none() {
                    return Err(AgentError::config(format!(
                        "postgres source '{}' is missing the 'credentials' block",
                        self.name
                    )));
                }
            }
            SourceKind::Sqlite | SourceKind::Json | SourceKind::File => {
                if self.path.is_none() {
                    return Err(AgentError::config(format!(
                        "{} source '{}' is missing 'path'",
                        self.kind, self.name
                    )));
                }
            }
            SourceKind::Openapi => {
                if self.base_url.is_none() {
                    return Err(AgentError::config(format!(
                        "openapi source '{}' is missing 'base_url'",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the Postgres connection URL from the environment.
    ///
    /// Returns a `Credentials` error naming every unset variable so the
    /// caller can report them all at once.
    pub fn postgres_url(&self) -> AgentResult<String> {
        let keys = self.credentials.as_ref().ok_or_else(|| {
            AgentError::config(format!(
                "postgres source '{}' has no credentials configured",
                self.name
            ))
        })?;

        let mut missing = Vec::new();
        let mut resolved = Vec::with_capacity(5);
        for (_, var) in keys.entries() {
            match env::var(var) {
                Ok(value) if !value.is_empty() => resolved.push(value),
                _ => missing.push(var.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(AgentError::Credentials {
                name: self.name.clone(),
                missing,
            });
        }

        let [host, port, dbname, user, password]: [String; 5] = resolved
            .try_into()
            .map_err(|_| AgentError::internal("credential resolution mismatch"))?;

        let mut url = url::Url::parse(&format!("postgres://{}:{}/{}", host, port, dbname))
            .map_err(|e| {
                AgentError::config(format!(
                    "invalid connection parameters for '{}': {}",
                    self.name, e
                ))
            })?;
        url.set_username(&user)
            .map_err(|_| AgentError::config("invalid database user name"))?;
        url.set_password(Some(&password))
            .map_err(|_| AgentError::config("invalid database password"))?;

        Ok(url.to_string())
    }
}

/// Top-level structure of the registry YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesFile {
    pub data_sources: Vec<SourceConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres_source(name: &str, prefix: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            kind: SourceKind::Postgres,
            description: String::new(),
            credentials: Some(CredentialKeys {
                host_env: format!("{prefix}_HOST"),
                port_env: format!("{prefix}_PORT"),
                dbname_env: format!("{prefix}_NAME"),
                user_env: format!("{prefix}_USER"),
                password_env: format!("{prefix}_PASSWORD"),
            }),
            path: None,
            base_url: None,
            spec_url: None,
            writable: false,
            ignore_tables: Vec::new(),
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        let yaml = "postgres";
        let kind: SourceKind = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(kind, SourceKind::Postgres);
        assert!(kind.is_database());
        assert!(!SourceKind::Openapi.is_database());
    }

    #[test]
    fn test_validate_requires_kind_fields() {
        let mut source = postgres_source("db", "TEST_VALIDATE");
        assert!(source.validate().is_ok());

        source.credentials = None;
        assert!(source.validate().is_err());

        let sqlite = SourceConfig {
            name: "local".to_string(),
            kind: SourceKind::Sqlite,
            description: String::new(),
            credentials: None,
            path: None,
            base_url: None,
            spec_url: None,
            writable: false,
            ignore_tables: Vec::new(),
        };
        assert!(sqlite.validate().is_err());
    }

    #[test]
    fn test_postgres_url_reports_all_missing_vars() {
        let source = postgres_source("bank", "SRC_TEST_MISSING_XYZQ");
        let err = source.postgres_url().unwrap_err();
        match err {
            AgentError::Credentials { name, missing } => {
                assert_eq!(name, "bank");
                assert_eq!(missing.len(), 5);
                assert!(missing.contains(&"SRC_TEST_MISSING_XYZQ_HOST".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_postgres_url_resolves_and_escapes() {
        // unique prefix so no interference with other tests
        let prefix = "SRC_TEST_RESOLVE_AB12";
        unsafe {
            env::set_var(format!("{prefix}_HOST"), "db.internal");
            env::set_var(format!("{prefix}_PORT"), "5433");
            env::set_var(format!("{prefix}_NAME"), "bank");
            env::set_var(format!("{prefix}_USER"), "svc");
            env::set_var(format!("{prefix}_PASSWORD"), "p@ss word");
        }
        let source = postgres_source("bank", prefix);
        let url = source.postgres_url().unwrap();
        assert!(url.starts_with("postgres://svc:"));
        assert!(url.contains("db.internal:5433/bank"));
        // special chars must be percent-encoded
        assert!(!url.contains("p@ss word"));
    }

    #[test]
    fn test_sources_file_parsing() {
        let yaml = r#"
data_sources:
  - name: bank_db
    type: postgres
    description: Core banking database
    credentials:
      host_env: BANK_DB_HOST
      port_env: BANK_DB_PORT
      dbname_env: BANK_DB_NAME
      user_env: BANK_DB_USER
      password_env: BANK_DB_PASSWORD
  - name: local_orders
    type: sqlite
    path: ./orders.db
    writable: true
  - name: payments_api
    type: openapi
    base_url: http://localhost:8001
"#;
        let file: SourcesFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.data_sources.len(), 3);
        assert_eq!(file.data_sources[0].kind, SourceKind::Postgres);
        assert!(!file.data_sources[0].writable);
        assert!(file.data_sources[1].writable);
        assert_eq!(
            file.data_sources[2].base_url.as_deref(),
            Some("http://localhost:8001")
        );
    }
}
