//! Bounded retries around a `Transport`.
//!
//! # Design
//! A `RetryPolicy` is fixed when the client is built. Every retry draws from
//! a total budget and from the budget of its phase (connect, read or status),
//! and retrying stops as soon as either runs dry. All budgets start at
//! `max_retries`, so with the default policy a call makes at most
//! `max_retries + 1` attempts.
//!
//! Connect failures are retried for any method because the request never
//! reached the server. Read failures and retryable statuses are retried only
//! for methods on the allow list. Other transport failures are returned
//! immediately.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ApiError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// GET and POST from the idempotent-plus-POST allow list; HEAD is on that
/// list too but is not a method this client sends.
pub const RETRY_METHODS: &[HttpMethod] = &[HttpMethod::Get, HttpMethod::Post];
pub const RETRY_STATUSES: &[u16] = &[500, 502, 503, 504];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub total: u32,
    pub connect: u32,
    pub read: u32,
    pub status: u32,
    pub allowed_methods: Vec<HttpMethod>,
    pub status_forcelist: Vec<u16>,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// The same budget for every phase, zero backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            total: max_retries,
            connect: max_retries,
            read: max_retries,
            status: max_retries,
            allowed_methods: RETRY_METHODS.to_vec(),
            status_forcelist: RETRY_STATUSES.to_vec(),
            backoff: Duration::ZERO,
        }
    }

    fn method_allowed(&self, request: &HttpRequest) -> bool {
        self.allowed_methods.contains(&request.method)
    }

    fn retries_status(&self, request: &HttpRequest, status: u16) -> bool {
        self.method_allowed(request) && self.status_forcelist.contains(&status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connect,
    Read,
    Status,
}

/// Remaining retries for one call.
#[derive(Debug)]
struct Budget {
    total: u32,
    connect: u32,
    read: u32,
    status: u32,
}

impl Budget {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            total: policy.total,
            connect: policy.connect,
            read: policy.read,
            status: policy.status,
        }
    }

    /// Take one retry for `phase`, or return false if none is left.
    fn take(&mut self, phase: Phase) -> bool {
        let slot = match phase {
            Phase::Connect => &mut self.connect,
            Phase::Read => &mut self.read,
            Phase::Status => &mut self.status,
        };
        if self.total == 0 || *slot == 0 {
            return false;
        }
        *slot -= 1;
        self.total -= 1;
        true
    }
}

/// Execute `request`, retrying according to `policy`.
///
/// Returns the first response that is not retried. Fails with
/// `RequestFailed` when a failure cannot be retried or the budget is spent.
pub fn execute_with_retry<T: Transport + ?Sized>(
    transport: &T,
    policy: &RetryPolicy,
    request: &HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let mut budget = Budget::new(policy);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        debug!(method = %request.method, url = %request.url, attempt, "sending request");

        let reason = match transport.execute(request) {
            Ok(response) if policy.retries_status(request, response.status) => {
                if !budget.take(Phase::Status) {
                    return Err(ApiError::request_failed(format!(
                        "max retries exceeded for {} {}: HTTP {} after {attempt} attempts",
                        request.method, request.url, response.status
                    )));
                }
                format!("HTTP {}", response.status)
            }
            Ok(response) => return Ok(response),
            Err(err) => {
                let phase = match err.kind {
                    TransportErrorKind::Connect => Some(Phase::Connect),
                    TransportErrorKind::Read if policy.method_allowed(request) => Some(Phase::Read),
                    _ => None,
                };
                let Some(phase) = phase else {
                    return Err(err.into());
                };
                if !budget.take(phase) {
                    return Err(ApiError::request_failed(format!(
                        "max retries exceeded for {} {}: {err} after {attempt} attempts",
                        request.method, request.url
                    )));
                }
                err.to_string()
            }
        };

        warn!(
            method = %request.method,
            url = %request.url,
            attempt,
            reason = %reason,
            "retrying request"
        );
        if !policy.backoff.is_zero() {
            thread::sleep(policy.backoff);
        }
    }
}
