//! Integration tests for openapi sources using a mocked HTTP server.

use data_source_agent::api::ApiClient;
use data_source_agent::models::source::{SourceConfig, SourceKind};
use data_source_agent::registry::SourceRegistry;
use data_source_agent::tools::api::{ApiToolHandler, CallApiInput, GetApiSchemaInput};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openapi_source(name: &str, base_url: &str, spec_url: Option<String>) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind: SourceKind::Openapi,
        description: "mock api".to_string(),
        credentials: None,
        path: None,
        base_url: Some(base_url.to_string()),
        spec_url,
        writable: false,
        ignore_tables: Vec::new(),
    }
}

fn handler(sources: Vec<SourceConfig>) -> ApiToolHandler {
    let registry = Arc::new(SourceRegistry::from_sources(sources).unwrap());
    let client = ApiClient::new(Duration::from_secs(5)).unwrap();
    ApiToolHandler::new(registry, client)
}

fn call(source: &str, endpoint: &str, http_method: &str) -> CallApiInput {
    CallApiInput {
        source: source.to_string(),
        endpoint: endpoint.to_string(),
        method: http_method.to_string(),
        body: None,
    }
}

#[tokio::test]
async fn test_get_api_schema_uses_default_spec_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openapi": "3.1.0",
            "info": { "title": "Mock API" }
        })))
        .mount(&server)
        .await;

    let handler = handler(vec![openapi_source("api", &server.uri(), None)]);
    let output = handler
        .get_api_schema(GetApiSchemaInput {
            source: "api".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(output.source, "api");
    assert_eq!(output.spec["info"]["title"], "Mock API");
}

#[tokio::test]
async fn test_get_api_schema_honors_spec_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/spec.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "openapi": "3.1.0" })))
        .mount(&server)
        .await;

    let spec_url = format!("{}/docs/spec.json", server.uri());
    let handler = handler(vec![openapi_source("api", &server.uri(), Some(spec_url))]);
    let output = handler
        .get_api_schema(GetApiSchemaInput {
            source: "api".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(output.spec["openapi"], "3.1.0");
}

#[tokio::test]
async fn test_call_api_returns_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Ariel Henryson" },
            { "id": 2, "name": "Jane Doe" }
        ])))
        .mount(&server)
        .await;

    let handler = handler(vec![openapi_source("api", &server.uri(), None)]);
    let response = handler.call_api(call("api", "/users", "GET")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["name"], "Ariel Henryson");
}

#[tokio::test]
async fn test_call_api_passes_through_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("user_id", "42"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "detail": "User with id 42 not found." })),
        )
        .mount(&server)
        .await;

    let handler = handler(vec![openapi_source("api", &server.uri(), None)]);
    let response = handler
        .call_api(call("api", "/transactions?user_id=42", "GET"))
        .await
        .unwrap();

    // Non-2xx responses are returned to the caller, not raised as errors
    assert_eq!(response.status, 404);
    assert_eq!(response.body["detail"], "User with id 42 not found.");
}

#[tokio::test]
async fn test_call_api_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3 })))
        .mount(&server)
        .await;

    let handler = handler(vec![openapi_source("api", &server.uri(), None)]);
    let mut input = call("api", "/users", "POST");
    input.body = Some(json!({ "name": "new user" }));
    let response = handler.call_api(input).await.unwrap();

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_call_api_rejects_unknown_method() {
    let server = MockServer::start().await;
    let handler = handler(vec![openapi_source("api", &server.uri(), None)]);

    let err = handler
        .call_api(call("api", "/users", "TRACE"))
        .await
        .err()
        .expect("TRACE should be rejected");

    assert!(err.to_string().contains("TRACE"), "got: {}", err);
}

#[tokio::test]
async fn test_call_api_rejects_non_api_source() {
    let server = MockServer::start().await;
    let sqlite = SourceConfig {
        name: "db".to_string(),
        kind: SourceKind::Sqlite,
        description: String::new(),
        credentials: None,
        path: Some("test.db".to_string()),
        base_url: None,
        spec_url: None,
        writable: false,
        ignore_tables: Vec::new(),
    };
    let handler = handler(vec![openapi_source("api", &server.uri(), None), sqlite]);

    let err = handler
        .call_api(call("db", "/users", "GET"))
        .await
        .err()
        .expect("sqlite source should be rejected");

    assert!(err.to_string().contains("openapi"), "got: {}", err);
}
