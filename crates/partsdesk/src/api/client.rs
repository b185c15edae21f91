//! HTTP plumbing shared by every endpoint binding.

use std::time::Duration;

use moka::sync::Cache;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::api::error::ApiError;
use crate::models::{ErrorBody, ErrorDetail, ServiceTypes};

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a fetched service-type catalog is reused.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

const API_PREFIX: &str = "/api/v1";

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    base_url: String,
    token: Option<SecretString>,
    connect_timeout: Duration,
    request_timeout: Duration,
    catalog_ttl: Duration,
}

impl ApiClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            catalog_ttl: DEFAULT_CATALOG_TTL,
        }
    }

    /// Bearer token sent with every request.
    pub fn token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn maybe_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::ClientBuild(format!(
                "base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }

        let http = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(self.catalog_ttl)
            .build();

        log::debug!("API client configured for {}", base_url);

        Ok(ApiClient {
            http,
            base_url,
            token: self.token,
            catalog,
        })
    }
}

/// Typed client for the parts service.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<SecretString>,
    pub(crate) catalog: Cache<(), ServiceTypes>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends a request and returns the successful response.
    pub(crate) async fn execute(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let span = tracing::debug_span!("api_request", operation);
        send_checked(operation, request).instrument(span).await
    }

    /// Sends a request and decodes the JSON body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(operation, request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    /// Sends a request whose response body carries nothing of interest.
    pub(crate) async fn execute_unit(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<(), ApiError> {
        self.execute(operation, request).await.map(|_| ())
    }
}

async fn send_checked(operation: &str, request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    tracing::debug!(status = status.as_u16(), "response received");
    if status.is_success() {
        return Ok(response);
    }
    let body = failure_body(operation, response.text().await);
    Err(error_from_body(operation, status, &body))
}

/// Body of a failed response. An unreadable body is logged and read as
/// empty, so the error falls back to the status reason.
fn failure_body<E: std::fmt::Display>(operation: &str, body: Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(operation, error = %e, "could not read error response body");
            String::new()
        }
    }
}

/// Maps a non-success response to an [`ApiError`].
pub(crate) fn error_from_body(operation: &str, status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    match parsed.map(|b| b.detail) {
        Some(ErrorDetail::Fields(fields)) if status == StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(fields)
        }
        Some(ErrorDetail::Message(message)) => {
            ApiError::operation_failed(operation, Some(status.as_u16()), message)
        }
        Some(ErrorDetail::Fields(fields)) => ApiError::operation_failed(
            operation,
            Some(status.as_u16()),
            fields
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Some(ErrorDetail::Other(value)) => {
            ApiError::operation_failed(operation, Some(status.as_u16()), value.to_string())
        }
        None => ApiError::operation_failed(
            operation,
            Some(status.as_u16()),
            fallback_message(status, body),
        ),
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_non_http_url() {
        let err = ApiClient::builder("ftp://parts.example.com").build().unwrap_err();
        assert!(matches!(err, ApiError::ClientBuild(_)));
    }

    #[test]
    fn test_url_joins_prefix() {
        let client = ApiClient::builder("https://parts.example.com/").build().unwrap();
        assert_eq!(client.base_url(), "https://parts.example.com");
        assert_eq!(
            client.url("/jobs/abc"),
            "https://parts.example.com/api/v1/jobs/abc"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::builder("http://localhost:8000")
            .token(SecretString::from("s3cret".to_string()))
            .build()
            .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("authenticated: true"));
    }

    #[test]
    fn test_422_becomes_validation_error() {
        let body = r#"{"detail":[{"loc":["query","name"],"msg":"field required","type":"value_error.missing"}]}"#;
        let err = error_from_body("create scraping job", StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field(), "name");
    }

    #[test]
    fn test_detail_message_is_used() {
        let err = error_from_body("delete job", StatusCode::NOT_FOUND, r#"{"detail":"Job not found"}"#);
        assert_eq!(err.to_string(), "delete job failed (404): Job not found");
    }

    #[test]
    fn test_plain_body_is_truncated() {
        let body = "x".repeat(500);
        let err = error_from_body("run scraping", StatusCode::BAD_GATEWAY, &body);
        match err {
            ApiError::OperationFailed { message, status, .. } => {
                assert_eq!(status, Some(502));
                assert_eq!(message.len(), MAX_ERROR_BODY + 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_body_falls_back_to_reason_phrase() {
        let body = failure_body("read job", Err::<String, _>("connection reset"));
        assert!(body.is_empty());
        let err = error_from_body("read job", StatusCode::SERVICE_UNAVAILABLE, &body);
        assert_eq!(err.to_string(), "read job failed (503): Service Unavailable");

        assert_eq!(failure_body::<&str>("read job", Ok("boom".to_string())), "boom");
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = error_from_body("estimate job", StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(err.to_string().ends_with("Internal Server Error"));
    }
}
