//! The I/O seam between `HttpClient` and the network.
//!
//! # Design
//! `Transport` executes one attempt of an `HttpRequest`. It returns HTTP
//! error statuses as ordinary responses and reports only failures where no
//! response exists, tagged with the phase they happened in so the retry layer
//! can budget them. Closures implement the trait too, which is how the unit
//! tests script a server.
//!
//! `UreqTransport` is the default. It owns one `ureq::Agent`, so connections
//! are pooled and kept alive across calls and threads.

use std::fmt;
use std::io;
use std::time::Duration;

use tracing::debug;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single request attempt.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by a pooled `ureq::Agent`.
///
/// The timeout covers one whole attempt (connect, send and receive); each
/// retry starts a fresh one.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(self.agent.get(&request.url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                decorate(self.agent.post(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => decorate(self.agent.post(&request.url), request).send_empty(),
        };
        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Only I/O failures while the body is still arriving count as read
        // errors; a size limit or bad encoding would repeat on every attempt.
        let bytes = response.body_mut().read_to_vec().map_err(classify)?;
        debug!(status, bytes = bytes.len(), "response received");
        let body = decode_body(status, bytes)?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    builder
}

/// The server has answered by now, so a body that is not UTF-8 is final.
fn decode_body(status: u16, bytes: Vec<u8>) -> Result<String, TransportError> {
    String::from_utf8(bytes).map_err(|e| {
        TransportError::new(
            TransportErrorKind::Other,
            format!("HTTP {status} response body is not valid UTF-8: {e}"),
        )
    })
}

/// Map a ureq failure onto the phase it happened in.
fn classify(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => TransportErrorKind::Connect,
        ureq::Error::Io(e) if is_connect_io(e) => TransportErrorKind::Connect,
        ureq::Error::Io(_) | ureq::Error::Timeout(_) => TransportErrorKind::Read,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}

fn is_connect_io(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable
    )
}
