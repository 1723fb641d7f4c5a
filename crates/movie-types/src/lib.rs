//! # Movie Types Crate
//!
//! Shared data model for the movie aggregation service.
//!
//! ## Main Components
//!
//! - **types**: `MovieInfo`, `Review` and the composed `Movie`
//! - **error**: Validation errors for provider payloads
//!
//! ## Wire format
//!
//! ```ignore
//! {
//!   "movieInfo": {
//!     "movieInfoId": "abc",
//!     "name": "Batman Begins",
//!     "year": 2005,
//!     "cast": ["Christian Bale", "Michael Cane"],
//!     "release_date": "2005-06-15"
//!   },
//!   "reviewList": [
//!     { "reviewId": "1", "movieInfoId": "abc", "comment": "Awesome Movie", "rating": 9.0 }
//!   ]
//! }
//! ```

pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{Movie, MovieInfo, MovieInfoId, Review, ReviewId};
