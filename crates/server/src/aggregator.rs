//! # Movie Aggregator
//!
//! Composes a [`Movie`] from the two downstream providers:
//! 1. Validate the id
//! 2. Fetch movie info and reviews concurrently (`tokio::join!`)
//! 3. Wait for both legs to settle
//! 4. Merge, or fail with the leg that decides the outcome
//!
//! ## Merge rules
//!
//! | Movie info | Reviews | Result |
//! |---|---|---|
//! | ok | ok (possibly empty) | `Movie { info, reviews }` |
//! | ok | not found | `Movie { info, [] }` |
//! | ok | failed | reviews failure |
//! | not found | any | `NotFound` |
//! | failed | any | movie-info failure |
//!
//! Retries live entirely in the downstream clients; nothing here retries.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use downstream::{
    DownstreamError, MovieInfoClient, MovieInfoProvider, ReviewsClient, ReviewsProvider,
};
use movie_types::{Movie, MovieInfo, Review};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::MovieError;

/// Fans out to both providers and merges their answers.
#[derive(Clone)]
pub struct MovieAggregator {
    movie_info: Arc<dyn MovieInfoProvider>,
    reviews: Arc<dyn ReviewsProvider>,
}

impl MovieAggregator {
    pub fn new(movie_info: Arc<dyn MovieInfoProvider>, reviews: Arc<dyn ReviewsProvider>) -> Self {
        Self {
            movie_info,
            reviews,
        }
    }

    /// Build the HTTP clients described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.call_timeout)
            .build()
            .context("Building HTTP client")?;
        let retry = config.retry_policy();

        let movie_info =
            MovieInfoClient::new(http.clone(), config.movie_info_url.clone(), retry.clone())
                .context("Creating movie-info client")?;
        let reviews = ReviewsClient::new(http, config.reviews_url.clone(), retry)
            .context("Creating reviews client")?;

        info!(
            "Aggregating movie info from {} and reviews from {}",
            movie_info.base_url(),
            reviews.base_url()
        );
        Ok(Self::new(Arc::new(movie_info), Arc::new(reviews)))
    }

    /// Main entry point: compose the movie for `id`.
    ///
    /// Both legs always run to a terminal outcome before the merge. Dropping
    /// the returned future abandons both legs, pending backoff included.
    pub async fn get_movie(&self, id: &str) -> Result<Movie, MovieError> {
        if id.trim().is_empty() {
            return Err(MovieError::InvalidId);
        }
        let start_time = Instant::now();

        let (movie_info, reviews) = tokio::join!(
            self.movie_info.movie_info(id),
            self.reviews.reviews(id)
        );
        let result = merge(id, movie_info, reviews);

        let elapsed = start_time.elapsed();
        match &result {
            Ok(movie) => info!(
                "Composed movie {} with {} reviews in {:.2?}",
                id,
                movie.review_list.len(),
                elapsed
            ),
            Err(e) => warn!("Could not compose movie {} after {:.2?}: {}", id, elapsed, e),
        }
        result
    }
}

/// Apply the merge rules to two settled legs. Movie info always wins ties.
fn merge(
    id: &str,
    movie_info: Result<MovieInfo, DownstreamError>,
    reviews: Result<Vec<Review>, DownstreamError>,
) -> Result<Movie, MovieError> {
    let movie_info = match movie_info {
        Ok(info) => info,
        Err(e) if e.is_not_found() => {
            return Err(MovieError::NotFound { id: id.to_string() });
        }
        Err(e) => return Err(MovieError::MovieInfo(e)),
    };

    let review_list = match reviews {
        Ok(reviews) => reviews,
        // A movie may legitimately have no reviews.
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(MovieError::Reviews(e)),
    };

    Ok(Movie::new(movie_info, review_list))
}
