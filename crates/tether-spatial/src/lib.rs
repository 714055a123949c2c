#![warn(missing_docs)]

//! Nearest-neighbour queries over a fixed point set.
//!
//! [`KdTree`] is built once from a slice of points and answers nearest and
//! radius queries in logarithmic expected time. It is immutable after
//! construction; callers rebuild it whenever the point set changes.

mod error;
mod kdtree;

pub use error::{Result, SpatialError};
pub use kdtree::{KdTree, Nearest};
