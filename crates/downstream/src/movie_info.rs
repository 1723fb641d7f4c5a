//! Client for the movie-info provider: `GET {base}/{id}`.

use async_trait::async_trait;
use movie_types::MovieInfo;
use tracing::{debug, error};
use url::Url;

use crate::error::{ClientBuildError, DownstreamError};
use crate::http;
use crate::outcome::{DownstreamOutcome, Service};
use crate::provider::MovieInfoProvider;
use crate::retry::RetryPolicy;

/// HTTP client for movie metadata.
#[derive(Debug, Clone)]
pub struct MovieInfoClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl MovieInfoClient {
    /// Create a client rooted at `base_url`, e.g. `http://localhost:8080/v1/movieinfo`.
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

    /// Fetch the metadata for `id`.
    ///
    /// 404 is terminal, 5xx and transport failures go through the retry policy,
    /// and a body that does not decode or breaks `MovieInfo` invariants is
    /// `Malformed`.
    pub async fn fetch(&self, id: &str) -> Result<MovieInfo, DownstreamError> {
        let url = self.url_for(id);
        debug!("Fetching movie info {} from {}", id, url);

        let result = self
            .retry
            .execute(Service::MovieInfo, id, || {
                let url = url.clone();
                async move {
                    http::get(&self.http, url)
                        .await
                        .and_then(http::decode::<MovieInfo>)
                        .and_then(|info| match info.validate() {
                            Ok(()) => DownstreamOutcome::Success(info),
                            Err(e) => DownstreamOutcome::Malformed(e.to_string()),
                        })
                }
            })
            .await;

        if let Err(e) = &result {
            if !e.is_not_found() {
                error!("movie info {} could not be fetched: {}", id, e);
            }
        }
        result
    }

    fn url_for(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url
    }
}

#[async_trait]
impl MovieInfoProvider for MovieInfoClient {
    async fn movie_info(&self, id: &str) -> Result<MovieInfo, DownstreamError> {
        self.fetch(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> MovieInfoClient {
        MovieInfoClient::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            RetryPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_appends_id_segment() {
        let url = client("http://localhost:8080/v1/movieinfo").url_for("abc");
        assert_eq!(url.as_str(), "http://localhost:8080/v1/movieinfo/abc");
    }

    #[test]
    fn test_url_tolerates_trailing_slash_and_escapes_id() {
        let url = client("http://localhost:8080/v1/movieinfo/").url_for("a b/c");
        assert_eq!(url.as_str(), "http://localhost:8080/v1/movieinfo/a%20b%2Fc");
    }

    #[test]
    fn test_rejects_base_without_path() {
        let result = MovieInfoClient::new(
            reqwest::Client::new(),
            Url::parse("mailto:movies@example.com").unwrap(),
            RetryPolicy::default(),
        );
        assert!(matches!(result, Err(ClientBuildError::InvalidBaseUrl(_))));
    }
}
