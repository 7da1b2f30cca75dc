//! Error types for the data request client.
//!
//! # Design
//! Callers see a single failure path: every network error, timeout, exhausted
//! retry budget, HTTP error status, undecodable body or unsupported method is
//! reported as `ApiError::RequestFailed` with the underlying cause as text.
//! Retries have already happened by the time a caller sees it.
//!
//! `TransportError` is internal plumbing between a `Transport` and the retry
//! layer, which needs to know which phase of the exchange failed.

use std::fmt;

use thiserror::Error;

/// The error returned by `HttpClient` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {cause}")]
    RequestFailed { cause: String },
}

impl ApiError {
    pub fn request_failed(cause: impl fmt::Display) -> Self {
        ApiError::RequestFailed {
            cause: cause.to_string(),
        }
    }

    /// The underlying cause, without the `request failed` prefix.
    pub fn cause(&self) -> &str {
        match self {
            ApiError::RequestFailed { cause } => cause,
        }
    }
}

/// Which part of an exchange a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Nothing reached the server (refused, unresolvable host).
    Connect,
    /// The request may have been sent but the response was lost or timed out.
    Read,
    /// Anything else, e.g. an invalid URL or a protocol violation.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Read => write!(f, "read"),
            TransportErrorKind::Other => write!(f, "transport"),
        }
    }
}

/// A failure reported by a `Transport` before any response was available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Read, message)
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::request_failed(err)
    }
}
