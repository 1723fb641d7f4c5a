//! Server crate for the movie aggregation service.
//!
//! This crate contains the aggregator that composes a `Movie` from the
//! movie-info and reviews providers, the translation of its failures into
//! HTTP responses, and the axum server exposing `GET /v1/movies/:id`.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;

pub use aggregator::MovieAggregator;
pub use api::{MovieServer, MovieServerHandle, ServerError};
pub use config::ServiceConfig;
pub use error::MovieError;
