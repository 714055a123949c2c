#![warn(missing_docs)]

//! Mesh kernel for the tether pipeline.
//!
//! The rope tools never edit geometry themselves; every heavy operation
//! (boolean intersection, convex hull, bevel, sweep, UV unwrap) goes through
//! the [`MeshKernel`] trait. [`NativeKernel`] implements all of it in pure
//! Rust on top of `tether-mesh` and `tether-curve`.
//!
//! All operations take their inputs by reference and return new values.
//!
//! # Example
//!
//! ```
//! use tether_kernel::{MeshKernel, NativeKernel};
//! use tether_mesh::primitives::cube;
//!
//! let kernel = NativeKernel;
//! let hull = kernel.convex_hull(&cube(2.0)).unwrap();
//! assert!(hull.is_closed());
//! ```

mod bevel;
mod convert;
mod dissolve;
mod error;
mod extrude;
mod hull;
mod section;
mod uv;

use serde::{Deserialize, Serialize};
use tether_curve::Curve;
use tether_mesh::Mesh;

pub use bevel::bevel_vertices;
pub use convert::{curve_to_mesh, mesh_to_curve};
pub use dissolve::dissolve_limited;
pub use error::{KernelError, Result};
pub use extrude::extrude_region;
pub use hull::convex_hull;
pub use section::{intersect, section_contours};
pub use uv::{follow_active_quads, unwrap_uv};

/// Options for [`MeshKernel::bevel_vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BevelOptions {
    /// Distance from the corner along each adjacent edge.
    pub offset: f64,
    /// Segments in the profile replacing each corner.
    pub segments: usize,
    /// Profile shape: 0 is a straight chamfer, 0.5 round, 1 puts the middle
    /// of the profile on the original corner.
    pub profile: f64,
    /// Limit the offset to half the shorter adjacent edge.
    pub clamp_overlap: bool,
}

impl Default for BevelOptions {
    fn default() -> Self {
        Self {
            offset: 0.1,
            segments: 2,
            profile: 0.5,
            clamp_overlap: true,
        }
    }
}

/// The geometry operations the rope pipeline composes.
///
/// Implementations must not mutate their inputs. Angles are in radians.
pub trait MeshKernel {
    /// Boolean intersection of `operand` with the closed `solid`.
    ///
    /// Returns an empty mesh when the two do not overlap.
    fn intersect(&self, operand: &Mesh, solid: &Mesh) -> Result<Mesh>;

    /// Extrude every face along the vertex normals by `thickness`, giving a
    /// closed shell per connected region.
    fn extrude_region(&self, mesh: &Mesh, thickness: f64) -> Result<Mesh>;

    /// Convex hull of the vertex set with outward triangles.
    fn convex_hull(&self, mesh: &Mesh) -> Result<Mesh>;

    /// Replace every polygon corner by a profile between two points on the
    /// adjacent edges.
    fn bevel_vertices(&self, mesh: &Mesh, options: &BevelOptions) -> Result<Mesh>;

    /// Merge vertices closer than `threshold`.
    fn weld(&self, mesh: &Mesh, threshold: f64) -> Result<Mesh>;

    /// One poly spline per edge chain.
    fn mesh_to_curve(&self, mesh: &Mesh) -> Result<Curve>;

    /// Sweep the curve's bevel cross-section into a mesh.
    fn curve_to_mesh(&self, curve: &Curve) -> Result<Mesh>;

    /// Angle-limited automatic unwrap into the unit square.
    fn unwrap_uv(&self, mesh: &Mesh, angle_limit: f64) -> Result<Mesh>;

    /// Propagate the UVs of `active_face` across neighbouring quads.
    fn follow_active_quads(&self, mesh: &Mesh, active_face: usize) -> Result<Mesh>;

    /// Merge nearly coplanar faces and dissolve straight-through vertices.
    fn dissolve_limited(&self, mesh: &Mesh, angle_limit: f64) -> Result<Mesh>;
}

/// Pure-Rust kernel built on the workspace's mesh and curve crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKernel;

impl MeshKernel for NativeKernel {
    fn intersect(&self, operand: &Mesh, solid: &Mesh) -> Result<Mesh> {
        intersect(operand, solid)
    }

    fn extrude_region(&self, mesh: &Mesh, thickness: f64) -> Result<Mesh> {
        extrude_region(mesh, thickness)
    }

    fn convex_hull(&self, mesh: &Mesh) -> Result<Mesh> {
        convex_hull(mesh)
    }

    fn bevel_vertices(&self, mesh: &Mesh, options: &BevelOptions) -> Result<Mesh> {
        bevel_vertices(mesh, options)
    }

    fn weld(&self, mesh: &Mesh, threshold: f64) -> Result<Mesh> {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(KernelError::InvalidInput(format!(
                "weld threshold {threshold}"
            )));
        }
        Ok(mesh.welded(threshold))
    }

    fn mesh_to_curve(&self, mesh: &Mesh) -> Result<Curve> {
        mesh_to_curve(mesh)
    }

    fn curve_to_mesh(&self, curve: &Curve) -> Result<Mesh> {
        curve_to_mesh(curve)
    }

    fn unwrap_uv(&self, mesh: &Mesh, angle_limit: f64) -> Result<Mesh> {
        unwrap_uv(mesh, angle_limit)
    }

    fn follow_active_quads(&self, mesh: &Mesh, active_face: usize) -> Result<Mesh> {
        follow_active_quads(mesh, active_face)
    }

    fn dissolve_limited(&self, mesh: &Mesh, angle_limit: f64) -> Result<Mesh> {
        dissolve_limited(mesh, angle_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_mesh::primitives::cube;

    #[test]
    fn test_weld_rejects_negative_threshold() {
        let err = NativeKernel.weld(&cube(1.0), -1.0).unwrap_err();
        assert!(matches!(err, KernelError::InvalidInput(_)));
    }

    #[test]
    fn test_bevel_options_serde_defaults() {
        let opts: BevelOptions = serde_json::from_str(r#"{"offset": 0.25}"#).unwrap();
        assert_eq!(opts.offset, 0.25);
        assert_eq!(opts.segments, 2);
        assert!(opts.clamp_overlap);
    }
}
