//! The data request client.
//!
//! # Design
//! `HttpClient` holds its configuration, the base URL, a retry policy and a
//! transport, all fixed at construction. `make_request` is three steps:
//! `build_request` turns the call arguments into an `HttpRequest`,
//! `execute_with_retry` runs it over the transport, and `parse_response`
//! turns the final `HttpResponse` into a `ResponseEnvelope`. The first and
//! last steps are pure and public, so a caller can also do its own I/O.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ACCEPT, API_KEY, APPLICATION_JSON, CONTENT_TYPE};
use crate::payload;
use crate::retry::{self, RetryPolicy};
use crate::transport::{Transport, UreqTransport};

/// A decoded JSON object plus the injected `status` field.
pub type ResponseEnvelope = Map<String, Value>;

/// Name of the field carrying the HTTP status in a `ResponseEnvelope`.
pub const STATUS_FIELD: &str = "status";

/// Blocking client for a JSON API authenticated by an `Api-Key` header.
///
/// Safe to share between threads when the transport is; the default
/// `UreqTransport` is.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport> {
    config: ClientConfig,
    base_url: String,
    retry_policy: RetryPolicy,
    transport: T,
}

impl HttpClient<UreqTransport> {
    /// Client with one retry and a 500 ms timeout per attempt.
    pub fn new(
        api_key: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        is_ssl: bool,
    ) -> Self {
        Self::from_config(ClientConfig::new(api_key, host, port, is_ssl))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let base_url = config.base_url();
        let retry_policy = RetryPolicy::new(config.max_retries);
        Self {
            config,
            base_url,
            retry_policy,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Serialize a payload the way `make_request` sends it.
    pub fn create_payload<P: Serialize + ?Sized>(&self, payload: &P) -> Result<String, ApiError> {
        payload::create_payload(payload)
    }

    /// Send a request and return the decoded JSON object with `status` added.
    ///
    /// `path` is joined to the base URL. An empty `payload` counts as none,
    /// and only POST requests carry a body. Any failure, including an HTTP
    /// status in the 4xx or 5xx range once retries are spent, is a `RequestFailed`.
    pub fn make_request(
        &self,
        path: &str,
        query_params: Option<&[(&str, &str)]>,
        payload: Option<&Map<String, Value>>,
        method: HttpMethod,
    ) -> Result<ResponseEnvelope, ApiError> {
        let request = self.build_request(path, query_params, payload, method)?;
        let response = retry::execute_with_retry(&self.transport, &self.retry_policy, &request)?;
        self.parse_response(response)
    }

    pub fn build_request(
        &self,
        path: &str,
        query_params: Option<&[(&str, &str)]>,
        payload: Option<&Map<String, Value>>,
        method: HttpMethod,
    ) -> Result<HttpRequest, ApiError> {
        let body = match payload.filter(|p| !p.is_empty()) {
            Some(p) => Some(self.create_payload(p)?),
            None => None,
        };
        let body = match method {
            HttpMethod::Post => body,
            HttpMethod::Get => {
                if body.is_some() {
                    debug!(path, "dropping payload on GET request");
                }
                None
            }
        };

        Ok(HttpRequest {
            method,
            url: self.join(path),
            query: query_params
                .unwrap_or_default()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: vec![
                (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
                (ACCEPT.to_string(), APPLICATION_JSON.to_string()),
                (API_KEY.to_string(), self.config.api_key.clone()),
            ],
            body,
        })
    }

    /// Reject error statuses, then decode the body and inject `status`.
    ///
    /// A `status` key sent by the server is overwritten.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ResponseEnvelope, ApiError> {
        check_status(&response)?;
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::request_failed(format!("invalid JSON response: {e}")))?;
        let mut envelope = match value {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::request_failed(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };
        envelope.insert(STATUS_FIELD.to_string(), Value::from(response.status));
        Ok(envelope)
    }

    fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_error() {
        return Err(ApiError::request_failed(format!(
            "HTTP {}: {}",
            response.status, response.body
        )));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
