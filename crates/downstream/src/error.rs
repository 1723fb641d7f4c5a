//! Error types for the downstream crate.

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::outcome::Service;

/// The last retryable failure seen before the retry budget ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// 5xx answer, with the provider's body verbatim.
    Server { status: u16, body: String },
    /// The provider could not be reached or the body could not be read.
    Transport(String),
}

impl Failure {
    /// Text forwarded to the caller: the server body, or the transport error.
    pub fn message(&self) -> &str {
        match self {
            Failure::Server { body, .. } => body,
            Failure::Transport(message) => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Server { status, .. } => Some(*status),
            Failure::Transport(_) => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Terminal failure of a downstream call.
///
/// Retryable failures never appear here directly: they are retried inside
/// [`crate::RetryPolicy::execute`] and only surface as [`DownstreamError::Exhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    #[error("{service} has no resource for id {id}")]
    NotFound { service: Service, id: String },

    /// A non-404 4xx answer. Not retried.
    #[error("{body}")]
    Rejected {
        service: Service,
        status: u16,
        body: String,
    },

    /// Displays exactly the last downstream body (or transport error text).
    #[error("{last}")]
    Exhausted {
        service: Service,
        attempts: u32,
        last: Failure,
    },

    #[error("malformed {service} payload: {reason}")]
    Malformed { service: Service, reason: String },
}

impl DownstreamError {
    pub fn service(&self) -> Service {
        match self {
            DownstreamError::NotFound { service, .. }
            | DownstreamError::Rejected { service, .. }
            | DownstreamError::Exhausted { service, .. }
            | DownstreamError::Malformed { service, .. } => *service,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DownstreamError::NotFound { .. })
    }

    /// Raw provider text to forward unchanged, when there is one.
    pub fn passthrough_body(&self) -> Option<&str> {
        match self {
            DownstreamError::Rejected { body, .. } => Some(body),
            DownstreamError::Exhausted { last, .. } => Some(last.message()),
            DownstreamError::NotFound { .. } | DownstreamError::Malformed { .. } => None,
        }
    }
}

/// Errors raised while constructing a client.
#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("base url {0} cannot carry path segments")]
    InvalidBaseUrl(Url),
}
