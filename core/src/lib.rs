//! Blocking JSON API client with an `Api-Key` header, bounded retries and a
//! per-attempt timeout.
//!
//! # Overview
//! `HttpClient::make_request` joins a path to `{http|https}://{host}:{port}`,
//! sends JSON headers and the API key, serializes an optional payload, and
//! returns the decoded JSON object with the HTTP status injected as `status`.
//! Every failure is reported as `ApiError::RequestFailed`.
//!
//! # Design
//! - Building the request and parsing the response are pure steps
//!   (`build_request`, `parse_response`); only the `Transport` does I/O.
//! - `UreqTransport` owns a pooled `ureq::Agent`, so one client can serve
//!   many threads.
//! - Retries are driven by `RetryPolicy` around the transport: connect, read
//!   and 5xx status failures, zero backoff, fixed budget per call.
//!
//! ```no_run
//! use data_request_core::{HttpClient, HttpMethod};
//!
//! let client = HttpClient::new("my-key", "localhost", "8080", false);
//! let status = client.make_request("/api/status", None, None, HttpMethod::Get)?;
//! println!("{}", status["status"]);
//! # Ok::<(), data_request_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod payload;
pub mod retry;
pub mod transport;

pub use client::{HttpClient, ResponseEnvelope, STATUS_FIELD};
pub use config::ClientConfig;
pub use error::{ApiError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use payload::create_payload;
pub use retry::RetryPolicy;
pub use transport::{Transport, UreqTransport};
