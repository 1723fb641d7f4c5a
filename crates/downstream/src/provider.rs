//! Provider traits consumed by the aggregator.
//!
//! The HTTP clients in this crate are the production implementations; tests
//! swap in in-memory fakes.

use async_trait::async_trait;
use movie_types::{MovieInfo, Review};

use crate::error::DownstreamError;

/// Source of movie metadata.
#[async_trait]
pub trait MovieInfoProvider: Send + Sync {
    /// Fetch one record. Retries, if any, happen inside the implementation.
    async fn movie_info(&self, id: &str) -> Result<MovieInfo, DownstreamError>;
}

/// Source of reviews for a movie.
#[async_trait]
pub trait ReviewsProvider: Send + Sync {
    /// Fetch every review for `movie_info_id`, fully materialized, in provider order.
    async fn reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, DownstreamError>;
}
