//! Runtime configuration for the aggregation service.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use downstream::{Backoff, RetryPolicy};
use url::Url;

pub const DEFAULT_LISTEN_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8082);
pub const DEFAULT_MOVIE_INFO_URL: &str = "http://localhost:8080/v1/movieinfo";
pub const DEFAULT_REVIEWS_URL: &str = "http://localhost:8081/v1/reviews";
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(2);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to wire the downstream clients and the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub movie_info_url: Url,
    pub reviews_url: Url,
    /// Total attempts per downstream call, initial one included.
    pub retry_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Timeout for a single downstream attempt. Expiry counts as a transport failure.
    pub call_timeout: Duration,
    /// Upper bound on a whole `/v1/movies/:id` request, retries included.
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Config pointing at the given providers, everything else defaulted.
    pub fn new(movie_info_url: Url, reviews_url: Url) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            movie_info_url,
            reviews_url,
            retry_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Retry policy shared by both clients.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Backoff::Exponential {
                base: self.backoff_base,
                multiplier: 2.0,
                max: self.backoff_max.max(self.backoff_base),
            },
        )
    }
}
