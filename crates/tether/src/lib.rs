#![warn(missing_docs)]

//! Surface-fitted rope curves.
//!
//! Four operations over owned mesh and curve values:
//!
//! - [`relax`] snaps a curve's control points onto a target surface.
//! - [`classify`] selects the faces of a mesh that face away from a
//!   reference normal.
//! - [`synthesize`] traces where a small planar patch meets a solid and
//!   returns that outline as a rope curve.
//! - [`bake`] sweeps a rope curve into a UV-mapped mesh.
//!
//! Geometry work goes through a [`MeshKernel`]; [`NativeKernel`] is the
//! built-in implementation. Inputs are never modified.
//!
//! # Example
//!
//! ```
//! use tether::{synthesize, NativeKernel, ReferencePatch, SynthesisParams};
//! use tether_math::Transform;
//! use tether_mesh::primitives::{plane, uv_sphere};
//!
//! let target = uv_sphere(1.0, 32, 16);
//! let patch = ReferencePatch::new(plane(0.2), Transform::translation(0.0, 0.0, 0.95));
//! let params = SynthesisParams {
//!     curve_tilt_degrees: 90.0,
//!     ..Default::default()
//! };
//!
//! let rope = synthesize(&NativeKernel, &target, &patch, &params).unwrap();
//! assert!(rope.is_cyclic());
//! ```

mod bake;
mod classify;
mod error;
mod params;
mod relax;
mod synthesize;

pub use bake::bake;
pub use classify::classify;
pub use error::{Result, Stage, TetherError};
pub use params::{
    BakeParams, RelaxParams, SynthesisParams, BEVEL_PROFILE, BEVEL_SEGMENTS,
    CAP_EXTRUDE_THICKNESS, CURVE_RESOLUTION, ROPE_OFFSET_BIAS,
};
pub use relax::relax;
pub use synthesize::{synthesize, ReferencePatch};
pub use tether_kernel::{MeshKernel, NativeKernel};
