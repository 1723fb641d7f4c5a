//! Aggregator failures and their translation into HTTP responses.
//!
//! | Failure | Status | Body |
//! |---|---|---|
//! | `InvalidId` | 400 | fixed message |
//! | `NotFound` | 404 | names the id |
//! | downstream retries exhausted | 500 | downstream body, verbatim |
//! | downstream 4xx (other than 404) | same 4xx | downstream body, verbatim |
//! | malformed downstream payload | 502 | names the provider |
//! | request timeout expired | 504 | names the id and the timeout |
//! | anything unexpected | 500 | `internal server error` |

use std::any::Any;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use downstream::DownstreamError;
use thiserror::Error;
use tracing::error;

pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Why `get_movie` could not produce a `Movie`.
#[derive(Error, Debug)]
pub enum MovieError {
    #[error("movie id must not be empty")]
    InvalidId,

    #[error("There is no MovieInfo available for the passed in id: {id}")]
    NotFound { id: String },

    /// The request timeout expired; both legs were dropped.
    #[error("movie {id} could not be composed within {after:?}")]
    TimedOut { id: String, after: Duration },

    /// The mandatory movie-info leg failed.
    #[error(transparent)]
    MovieInfo(DownstreamError),

    /// Movie info was fetched but the reviews leg failed.
    #[error(transparent)]
    Reviews(DownstreamError),
}

impl MovieError {
    /// Convert to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MovieError::InvalidId => StatusCode::BAD_REQUEST,
            MovieError::NotFound { .. } => StatusCode::NOT_FOUND,
            MovieError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            MovieError::MovieInfo(e) | MovieError::Reviews(e) => downstream_status(e),
        }
    }

    /// Text returned to the caller. Downstream bodies are passed through unchanged.
    pub fn message(&self) -> String {
        match self {
            MovieError::MovieInfo(e) | MovieError::Reviews(e) => match e.passthrough_body() {
                Some(body) => body.to_string(),
                None => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

fn downstream_status(error: &DownstreamError) -> StatusCode {
    match error {
        DownstreamError::NotFound { .. } => StatusCode::NOT_FOUND,
        DownstreamError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_REQUEST),
        DownstreamError::Exhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DownstreamError::Malformed { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for MovieError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, message);
        }
        (status, message).into_response()
    }
}

/// Generic 500 for failures nothing classified, e.g. a panicking handler.
pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

pub(crate) fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);
    internal_error()
}
