//! HTTP request and response types as plain data.
//!
//! # Design
//! `HttpClient` builds an `HttpRequest` and parses an `HttpResponse` without
//! touching the network. Only the `Transport` in between performs I/O, so the
//! request shape and response handling stay deterministic and testable on
//! their own.
//!
//! A request is built once per call and then sent again, unchanged, on every
//! retry attempt, so it owns its data and the transport only borrows it.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const API_KEY: &str = "Api-Key";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request. Only GET and POST are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    /// Accepts method names case-insensitively. Anything other than GET or
    /// POST is rejected here, before a request can be built.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(ApiError::request_failed(format!("unsupported HTTP method: {s}"))),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HttpClient::build_request`. Query pairs are kept apart from the
/// URL and encoded by the transport, in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport`, then passed to `HttpClient::parse_response`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// True for 4xx and 5xx statuses.
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_methods() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
    }

    #[test]
    fn rejects_other_methods() {
        for name in ["PUT", "DELETE", "HEAD", ""] {
            let err = name.parse::<HttpMethod>().unwrap_err();
            assert!(err.to_string().starts_with("request failed"), "{name}: {err}");
        }
    }

    #[test]
    fn default_method_is_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn error_statuses() {
        let response = |status| HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(!response(200).is_error());
        assert!(!response(302).is_error());
        assert!(response(404).is_error());
        assert!(response(503).is_error());
        assert!(response(599).is_error());
        assert!(!response(600).is_error());
        assert!(!response(999).is_error());
    }
}
