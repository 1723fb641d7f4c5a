//! Core domain types for the movie aggregate.
//!
//! `MovieInfo` and `Review` are owned by the two downstream providers and are
//! only ever decoded from their JSON payloads. `Movie` is assembled fresh for
//! every request and is never partially populated.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque identifier of a movie-info record.
///
/// The metadata provider uses strings, the reviews provider stores the same id
/// as a number; both are normalized to a `String` on decode.
pub type MovieInfoId = String;

/// Opaque identifier of a review record.
pub type ReviewId = String;

// =============================================================================
// Movie Info
// =============================================================================

/// Metadata for one movie, as returned by the movie-info provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    /// Present only once the record has been created upstream.
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub movie_info_id: Option<MovieInfoId>,
    pub name: String,
    pub year: i32,
    pub cast: Vec<String>,
    #[serde(rename = "release_date")]
    pub release_date: NaiveDate,
}

impl MovieInfo {
    /// Check the invariants a well-formed provider payload must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.year <= 0 {
            return Err(ValidationError::NonPositiveYear(self.year));
        }
        if self.cast.is_empty() {
            return Err(ValidationError::EmptyCast);
        }
        if let Some(position) = self.cast.iter().position(|member| member.trim().is_empty()) {
            return Err(ValidationError::BlankCastMember(position));
        }
        Ok(())
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// A single review, as returned by the reviews provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub review_id: Option<ReviewId>,
    /// Foreign key into the movie-info provider, not enforced locally.
    /// Reviews without one are kept rather than failing the whole list.
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub movie_info_id: Option<MovieInfoId>,
    #[serde(default)]
    pub comment: String,
    pub rating: f64,
}

// =============================================================================
// Aggregate
// =============================================================================

/// The composed view: one `MovieInfo` plus its reviews in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_info: MovieInfo,
    pub review_list: Vec<Review>,
}

impl Movie {
    pub fn new(movie_info: MovieInfo, review_list: Vec<Review>) -> Self {
        Self {
            movie_info,
            review_list,
        }
    }

    /// Mean rating across all reviews, `None` when there are none.
    pub fn average_rating(&self) -> Option<f64> {
        if self.review_list.is_empty() {
            return None;
        }
        let total: f64 = self.review_list.iter().map(|r| r.rating).sum();
        Some(total / self.review_list.len() as f64)
    }
}

// =============================================================================
// Identifier decoding
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
