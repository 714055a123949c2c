#![warn(missing_docs)]

//! Curves for the tether pipeline.
//!
//! A [`Curve`] is a list of splines (poly, Bezier or NURBS) whose control
//! points carry a tilt, plus the parameters of the tube swept along it:
//! bevel depth, extrude and offset. Evaluation turns splines into
//! polylines with interpolated tilt; [`rotation_minimizing_frames`] gives
//! the frames a cross-section is placed in.

mod curve;
mod error;
mod eval;
mod frames;

pub use curve::{ControlPoint, Curve, Dimensions, Spline, SplineKind, DEFAULT_ORDER};
pub use error::{CurveError, Result};
pub use eval::{EvaluatedSpline, Sample};
pub use frames::{rotation_minimizing_frames, Frame};
