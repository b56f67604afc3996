//! HTTP client for openapi sources and remote file reads.

use std::time::Duration;

use reqwest::Method;
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::models::source::{SourceConfig, SourceKind};

/// Response from an API call: status plus the body as JSON when possible,
/// raw text otherwise.
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, parsed as JSON when the payload allows it
    pub body: serde_json::Value,
}

/// Shared HTTP client for openapi sources.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    /// Build a client with the given request timeout.
    pub fn new(timeout: Duration) -> AgentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch the OpenAPI document for a source.
    ///
    /// Uses `spec_url` when configured, otherwise `<base_url>/openapi.json`.
    pub async fn fetch_spec(&self, source: &SourceConfig) -> AgentResult<serde_json::Value> {
        let url = match &source.spec_url {
            Some(url) => url.clone(),
            None => join_url(self.base_url(source)?, "openapi.json"),
        };
        debug!(source = %source.name, url = %url, "Fetching API schema");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::http(format!(
                "Schema request to {} returned {}",
                url, status
            )));
        }
        let spec = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AgentError::http(format!("Schema at {} is not valid JSON: {}", url, e)))?;
        Ok(spec)
    }

    /// Perform a request against an openapi source.
    ///
    /// The endpoint is joined to the configured base URL; surrounding slashes
    /// on either side are normalized. Non-2xx statuses are returned to the
    /// caller rather than treated as errors, since the status itself is
    /// information the model needs.
    pub async fn request(
        &self,
        source: &SourceConfig,
        method: &str,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> AgentResult<ApiResponse> {
        let method = parse_method(method)?;
        let url = join_url(self.base_url(source)?, endpoint);
        debug!(source = %source.name, %method, url = %url, "Calling API");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();

        let text = response.text().await?;
        let body = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => json,
            Err(_) => serde_json::Value::String(text),
        };

        Ok(ApiResponse { status, body })
    }

    fn base_url<'a>(&self, source: &'a SourceConfig) -> AgentResult<&'a str> {
        if source.kind != SourceKind::Openapi {
            return Err(AgentError::kind_mismatch(
                &source.name,
                "openapi",
                source.kind.as_str(),
            ));
        }
        source.base_url.as_deref().ok_or_else(|| {
            AgentError::config(format!("openapi source '{}' has no base_url", source.name))
        })
    }
}

/// Join a base URL and an endpoint path with exactly one slash between them.
fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Validate and parse an HTTP method name.
fn parse_method(method: &str) -> AgentResult<Method> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(AgentError::invalid_input(format!(
            "Unsupported HTTP method '{}'. Use GET, POST, PUT, PATCH, or DELETE.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://localhost:8001/", "/users"),
            "http://localhost:8001/users"
        );
        assert_eq!(
            join_url("http://localhost:8001", "users"),
            "http://localhost:8001/users"
        );
        assert_eq!(
            join_url("http://localhost:8001", "/users/1/transactions"),
            "http://localhost:8001/users/1/transactions"
        );
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("POST").unwrap(), Method::POST);
        assert!(parse_method("TRACE").is_err());
    }
}
