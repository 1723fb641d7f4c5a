//! HTTP clients for the two downstream providers.
//!
//! This crate owns everything that touches the network:
//! - Classifying each HTTP exchange into a [`DownstreamOutcome`]
//! - Retrying server and transport failures with backoff ([`RetryPolicy`])
//! - Decoding payloads into `movie_types` values
//! - Surfacing only terminal failures as [`DownstreamError`]
//!
//! ## Example Usage
//! ```ignore
//! use downstream::{MovieInfoClient, RetryPolicy};
//!
//! let client = MovieInfoClient::new(
//!     reqwest::Client::new(),
//!     "http://localhost:8080/v1/movieinfo".parse()?,
//!     RetryPolicy::default(),
//! )?;
//! let info = client.fetch("abc").await?;
//! ```

pub mod error;
mod http;
pub mod movie_info;
pub mod outcome;
pub mod provider;
pub mod retry;
pub mod reviews;

pub use error::{ClientBuildError, DownstreamError, Failure};
pub use movie_info::MovieInfoClient;
pub use outcome::{DownstreamOutcome, Service};
pub use provider::{MovieInfoProvider, ReviewsProvider};
pub use retry::{Backoff, RetryOn, RetryPolicy};
pub use reviews::ReviewsClient;
