//! Error types for the spatial index.

use thiserror::Error;

/// Errors that can occur while building a spatial index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// No points were supplied.
    #[error("cannot build a spatial index over zero points")]
    EmptyIndex,

    /// A point had a NaN or infinite coordinate.
    #[error("point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),
}

/// Result type for spatial index operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
