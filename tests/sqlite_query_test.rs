//! Integration tests for the run_sql tool against SQLite sources.
//!
//! These cover the read path, the write path on writable sources, and the
//! rejection of writes and transaction control on read-only sources.

use data_source_agent::models::source::{SourceConfig, SourceKind};
use data_source_agent::registry::SourceRegistry;
use data_source_agent::tools::format::OutputFormat;
use data_source_agent::tools::query::{QueryParamInput, QueryToolHandler, RunSqlInput};
use std::sync::Arc;
use tempfile::TempDir;

fn sqlite_source(name: &str, path: &str, writable: bool) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind: SourceKind::Sqlite,
        description: "test database".to_string(),
        credentials: None,
        path: Some(path.to_string()),
        base_url: None,
        spec_url: None,
        writable,
        ignore_tables: Vec::new(),
    }
}

fn input(source: &str, sql: &str) -> RunSqlInput {
    RunSqlInput {
        source: source.to_string(),
        sql: sql.to_string(),
        params: vec![],
        limit: None,
        timeout_secs: None,
        format: OutputFormat::default(),
    }
}

/// Set up a writable and a read-only source pointing at the same database
/// file, with a small seeded table.
async fn setup() -> (QueryToolHandler, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let db_path = db_path.to_str().unwrap();

    let registry = Arc::new(
        SourceRegistry::from_sources(vec![
            sqlite_source("rw", db_path, true),
            sqlite_source("ro", db_path, false),
        ])
        .unwrap(),
    );
    let handler = QueryToolHandler::new(registry);

    handler
        .run_sql(input(
            "rw",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, balance REAL)",
        ))
        .await
        .expect("Failed to create table");
    handler
        .run_sql(input(
            "rw",
            "INSERT INTO users (name, balance) VALUES ('alice', 10.5), ('bob', 20.0), ('carol', 3.25)",
        ))
        .await
        .expect("Failed to seed table");

    (handler, dir)
}

#[tokio::test]
async fn test_select_returns_rows_and_columns() {
    let (handler, _dir) = setup().await;

    let output = handler
        .run_sql(input("ro", "SELECT id, name, balance FROM users ORDER BY id"))
        .await
        .unwrap();

    assert_eq!(output.row_count, 3);
    assert!(!output.truncated);
    assert_eq!(output.columns.len(), 3);
    assert_eq!(output.columns[0].name, "id");
    assert_eq!(output.rows[0]["name"], "alice");
    assert_eq!(output.rows[2]["name"], "carol");
}

#[tokio::test]
async fn test_parameterized_select() {
    let (handler, _dir) = setup().await;

    let mut req = input("ro", "SELECT name FROM users WHERE id = ?");
    req.params = vec![QueryParamInput::Int(2)];
    let output = handler.run_sql(req).await.unwrap();

    assert_eq!(output.row_count, 1);
    assert_eq!(output.rows[0]["name"], "bob");
}

#[tokio::test]
async fn test_limit_truncates_result() {
    let (handler, _dir) = setup().await;

    let mut req = input("ro", "SELECT * FROM users ORDER BY id");
    req.limit = Some(2);
    let output = handler.run_sql(req).await.unwrap();

    assert_eq!(output.row_count, 2);
    assert!(output.truncated);
}

#[tokio::test]
async fn test_write_reports_rows_affected() {
    let (handler, _dir) = setup().await;

    let output = handler
        .run_sql(input("rw", "UPDATE users SET balance = 0 WHERE balance > 5"))
        .await
        .unwrap();

    assert_eq!(output.rows_affected, Some(2));
    assert_eq!(output.row_count, 0);
}

#[tokio::test]
async fn test_write_rejected_on_readonly_source() {
    let (handler, _dir) = setup().await;

    let err = handler
        .run_sql(input("ro", "DELETE FROM users"))
        .await
        .err()
        .expect("DELETE should be rejected on a read-only source");

    assert!(err.to_string().contains("read-only"), "got: {}", err);
}

#[tokio::test]
async fn test_ddl_rejected_on_readonly_source() {
    let (handler, _dir) = setup().await;

    let err = handler
        .run_sql(input("ro", "DROP TABLE users"))
        .await
        .err()
        .expect("DROP should be rejected on a read-only source");

    assert!(err.to_string().contains("read-only"), "got: {}", err);
}

#[tokio::test]
async fn test_transaction_control_rejected() {
    let (handler, _dir) = setup().await;

    // Even writable sources run in auto-commit mode
    let err = handler
        .run_sql(input("rw", "BEGIN"))
        .await
        .err()
        .expect("BEGIN should be rejected");

    assert!(err.to_string().contains("auto-commit"), "got: {}", err);
}

#[tokio::test]
async fn test_unknown_source_lists_available() {
    let (handler, _dir) = setup().await;

    let err = handler
        .run_sql(input("nope", "SELECT 1"))
        .await
        .err()
        .unwrap();

    let msg = err.to_string();
    assert!(msg.contains("nope"), "got: {}", msg);
}

#[tokio::test]
async fn test_table_format_output() {
    let (handler, _dir) = setup().await;

    let mut req = input("ro", "SELECT name FROM users ORDER BY id");
    req.format = OutputFormat::Table;
    let output = handler.run_sql(req).await.unwrap();

    let formatted = output.formatted.expect("table format should be rendered");
    assert!(formatted.contains("alice"));
    assert!(formatted.contains("rows in set"));
    assert!(output.rows.is_empty());
}
