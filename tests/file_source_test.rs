//! Integration tests for reading file and json sources, local and remote.

use data_source_agent::models::source::{SourceConfig, SourceKind};
use data_source_agent::registry::SourceRegistry;
use data_source_agent::tools::file::{FileToolHandler, ReadSourceInput};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(name: &str, kind: SourceKind, path: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind,
        description: String::new(),
        credentials: None,
        path: Some(path.to_string()),
        base_url: None,
        spec_url: None,
        writable: false,
        ignore_tables: Vec::new(),
    }
}

fn handler(sources: Vec<SourceConfig>, max_bytes: u64) -> FileToolHandler {
    let registry = Arc::new(SourceRegistry::from_sources(sources).unwrap());
    FileToolHandler::new(registry, reqwest::Client::new(), max_bytes)
}

fn read(name: &str) -> ReadSourceInput {
    ReadSourceInput {
        source: name.to_string(),
    }
}

#[tokio::test]
async fn test_read_plain_file() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    tokio::fs::write(&file_path, "tax rules:\n- rule one\n- rule two\n")
        .await
        .unwrap();

    let handler = handler(
        vec![source("notes", SourceKind::File, file_path.to_str().unwrap())],
        1024,
    );
    let output = handler.read_source(read("notes")).await.unwrap();

    assert_eq!(output.source, "notes");
    assert!(output.content.contains("rule one"));
    assert!(!output.truncated);
}

#[tokio::test]
async fn test_read_json_source_pretty_prints() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("settings.json");
    tokio::fs::write(&file_path, r#"{"rates":{"vat":0.17},"currency":"ILS"}"#)
        .await
        .unwrap();

    let handler = handler(
        vec![source("settings", SourceKind::Json, file_path.to_str().unwrap())],
        4096,
    );
    let output = handler.read_source(read("settings")).await.unwrap();

    // Compact input comes back pretty-printed
    assert!(output.content.contains("\"vat\": 0.17"));
    assert!(output.content.contains('\n'));
}

#[tokio::test]
async fn test_json_source_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("bad.json");
    tokio::fs::write(&file_path, "not json at all").await.unwrap();

    let handler = handler(
        vec![source("bad", SourceKind::Json, file_path.to_str().unwrap())],
        4096,
    );

    let err = handler.read_source(read("bad")).await.err().unwrap();
    assert!(err.to_string().contains("JSON"), "got: {}", err);
}

#[tokio::test]
async fn test_large_file_is_truncated() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("big.txt");
    tokio::fs::write(&file_path, "x".repeat(500)).await.unwrap();

    let handler = handler(
        vec![source("big", SourceKind::File, file_path.to_str().unwrap())],
        100,
    );
    let output = handler.read_source(read("big")).await.unwrap();

    assert!(output.truncated);
    assert_eq!(output.content.len(), 100);
}

#[tokio::test]
async fn test_read_remote_file_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/report.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("remote report body"))
        .mount(&server)
        .await;

    let url = format!("{}/data/report.txt", server.uri());
    let handler = handler(vec![source("report", SourceKind::File, &url)], 1024);
    let output = handler.read_source(read("report")).await.unwrap();

    assert_eq!(output.content, "remote report body");
}

#[tokio::test]
async fn test_remote_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.txt", server.uri());
    let handler = handler(vec![source("gone", SourceKind::File, &url)], 1024);

    let err = handler.read_source(read("gone")).await.err().unwrap();
    assert!(err.to_string().contains("404"), "got: {}", err);
}

#[tokio::test]
async fn test_database_source_rejected() {
    let handler = handler(
        vec![source("db", SourceKind::Sqlite, "some.db")],
        1024,
    );

    let err = handler.read_source(read("db")).await.err().unwrap();
    assert!(err.to_string().contains("file or json"), "got: {}", err);
}
