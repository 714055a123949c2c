//! Error types for kernel operations.

use tether_curve::CurveError;
use tether_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur in a [`MeshKernel`](crate::MeshKernel) operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// A boolean operand that must be closed has open edges.
    #[error("boolean solid is not closed")]
    OpenSolid,

    /// The point set spans no volume.
    #[error("convex hull is degenerate: {0}")]
    DegenerateHull(String),

    /// Input rejected before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The input topology is outside what this kernel handles.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Mesh construction or edit failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Curve validation failed.
    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
