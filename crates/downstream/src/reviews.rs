//! Client for the reviews provider: `GET {base}?movieInfoId={id}`.

use async_trait::async_trait;
use movie_types::Review;
use tracing::{debug, error};
use url::Url;

use crate::error::{ClientBuildError, DownstreamError};
use crate::http;
use crate::outcome::Service;
use crate::provider::ReviewsProvider;
use crate::retry::RetryPolicy;

const MOVIE_INFO_ID_PARAM: &str = "movieInfoId";

/// HTTP client for movie reviews.
#[derive(Debug, Clone)]
pub struct ReviewsClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl ReviewsClient {
    /// Create a client rooted at `base_url`, e.g. `http://localhost:8081/v1/reviews`.
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        retry: RetryPolicy,
    ) -> Result<Self, ClientBuildError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientBuildError::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch every review for `movie_info_id`.
    ///
    /// The provider answers 404 when a movie has no reviews, so 404 resolves
    /// to an empty list here instead of an error.
    pub async fn fetch(&self, movie_info_id: &str) -> Result<Vec<Review>, DownstreamError> {
        let url = self.url_for(movie_info_id);
        debug!("Fetching reviews for {} from {}", movie_info_id, url);

        let result = self
            .retry
            .execute(Service::Reviews, movie_info_id, || {
                let url = url.clone();
                async move {
                    http::get(&self.http, url)
                        .await
                        .and_then(http::decode::<Vec<Review>>)
                }
            })
            .await;

        match result {
            Ok(reviews) => {
                debug!("Fetched {} reviews for {}", reviews.len(), movie_info_id);
                Ok(reviews)
            }
            Err(DownstreamError::NotFound { .. }) => {
                debug!("No reviews for {}", movie_info_id);
                Ok(Vec::new())
            }
            Err(e) => {
                error!("reviews for {} could not be fetched: {}", movie_info_id, e);
                Err(e)
            }
        }
    }

    fn url_for(&self, movie_info_id: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(MOVIE_INFO_ID_PARAM, movie_info_id);
        url
    }
}

#[async_trait]
impl ReviewsProvider for ReviewsClient {
    async fn reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, DownstreamError> {
        self.fetch(movie_info_id).await
    }
}
