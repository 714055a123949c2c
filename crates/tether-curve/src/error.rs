//! Error types for curve validation.

use thiserror::Error;

/// Errors reported by [`Curve::validate`](crate::Curve::validate).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// The curve has no splines.
    #[error("curve has no splines")]
    NoSplines,

    /// A spline has no control points.
    #[error("spline {0} has no control points")]
    EmptySpline(usize),

    /// A NURBS spline order below 2.
    #[error("spline {spline} has invalid order {order}")]
    InvalidOrder {
        /// Offending spline.
        spline: usize,
        /// Its order.
        order: usize,
    },

    /// A control point, handle or tilt is NaN or infinite.
    #[error("spline {spline} point {point} is not finite")]
    NonFinite {
        /// Offending spline.
        spline: usize,
        /// Offending point.
        point: usize,
    },

    /// A render parameter is out of range.
    #[error("invalid curve parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for curve operations.
pub type Result<T> = std::result::Result<T, CurveError>;
