//! Classification of a single downstream call.
//!
//! Every HTTP exchange with a provider is reduced to a [`DownstreamOutcome`]
//! before the retry loop looks at it. Only terminal outcomes ever leave this
//! crate, converted into a [`DownstreamError`].

use std::fmt;

use crate::error::{DownstreamError, Failure};

/// Which downstream provider a call was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    MovieInfo,
    Reviews,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::MovieInfo => f.write_str("movie-info"),
            Service::Reviews => f.write_str("reviews"),
        }
    }
}

/// Tagged result of one attempt against a downstream provider.
#[derive(Debug, Clone, PartialEq)]
pub enum DownstreamOutcome<T> {
    /// 2xx with a body that decoded into `T`.
    Success(T),
    /// 404, authoritative "does not exist".
    NotFound,
    /// Any other 4xx. Terminal, the request itself was refused.
    ClientError { status: u16, body: String },
    /// 5xx. Body kept verbatim so it can be passed through to the caller.
    ServerError { status: u16, body: String },
    /// Connection refused, reset, timed out, or the body could not be read.
    TransportError(String),
    /// The provider answered but the payload could not be used.
    Malformed(String),
}

impl DownstreamOutcome<String> {
    /// Classify a raw HTTP status and body.
    pub fn classify(status: u16, body: String) -> Self {
        match status {
            200..=299 => DownstreamOutcome::Success(body),
            404 => DownstreamOutcome::NotFound,
            400..=499 => DownstreamOutcome::ClientError { status, body },
            500..=599 => DownstreamOutcome::ServerError { status, body },
            other => DownstreamOutcome::Malformed(format!("unexpected status {other}")),
        }
    }
}

impl<T> DownstreamOutcome<T> {
    /// Chain a fallible step onto a successful outcome.
    pub fn and_then<U, F>(self, f: F) -> DownstreamOutcome<U>
    where
        F: FnOnce(T) -> DownstreamOutcome<U>,
    {
        match self {
            DownstreamOutcome::Success(value) => f(value),
            DownstreamOutcome::NotFound => DownstreamOutcome::NotFound,
            DownstreamOutcome::ClientError { status, body } => {
                DownstreamOutcome::ClientError { status, body }
            }
            DownstreamOutcome::ServerError { status, body } => {
                DownstreamOutcome::ServerError { status, body }
            }
            DownstreamOutcome::TransportError(message) => DownstreamOutcome::TransportError(message),
            DownstreamOutcome::Malformed(reason) => DownstreamOutcome::Malformed(reason),
        }
    }

    pub fn map<U, F>(self, f: F) -> DownstreamOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        self.and_then(|value| DownstreamOutcome::Success(f(value)))
    }

    /// The failure carried by a server or transport outcome.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            DownstreamOutcome::ServerError { status, body } => Some(Failure::Server {
                status: *status,
                body: body.clone(),
            }),
            DownstreamOutcome::TransportError(message) => {
                Some(Failure::Transport(message.clone()))
            }
            _ => None,
        }
    }

    /// Convert a terminal outcome into the crate's public result.
    ///
    /// `attempts` is how many calls were made before this outcome was final.
    pub fn into_result(
        self,
        service: Service,
        id: &str,
        attempts: u32,
    ) -> Result<T, DownstreamError> {
        match self {
            DownstreamOutcome::Success(value) => Ok(value),
            DownstreamOutcome::NotFound => Err(DownstreamError::NotFound {
                service,
                id: id.to_string(),
            }),
            DownstreamOutcome::ClientError { status, body } => Err(DownstreamError::Rejected {
                service,
                status,
                body,
            }),
            DownstreamOutcome::ServerError { status, body } => Err(DownstreamError::Exhausted {
                service,
                attempts,
                last: Failure::Server { status, body },
            }),
            DownstreamOutcome::TransportError(message) => Err(DownstreamError::Exhausted {
                service,
                attempts,
                last: Failure::Transport(message),
            }),
            DownstreamOutcome::Malformed(reason) => {
                Err(DownstreamError::Malformed { service, reason })
            }
        }
    }
}
