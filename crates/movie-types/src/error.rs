//! Error types for the movie-types crate.

use thiserror::Error;

/// A decoded `MovieInfo` payload that breaks one of its invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("movie name must not be empty")]
    EmptyName,

    #[error("release year must be positive, got {0}")]
    NonPositiveYear(i32),

    #[error("cast must list at least one member")]
    EmptyCast,

    #[error("cast member at position {0} is blank")]
    BlankCastMember(usize),
}
