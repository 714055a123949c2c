//! Bake a rope curve into a textured mesh.

use log::debug;
use tether_curve::Curve;
use tether_kernel::MeshKernel;
use tether_mesh::Mesh;

use crate::error::{Result, Stage, TetherError};
use crate::params::BakeParams;

/// Sweep `curve` into a mesh, lay out UVs and dissolve flat regions.
///
/// The sweep is unwrapped with an angle-limited projection, then the UVs of
/// `params.active_face` are followed across the quads so the rope texture
/// runs along the curve. A limited dissolve finally merges nearly coplanar
/// faces without crossing UV seams. The curve is not modified.
pub fn bake<K: MeshKernel>(kernel: &K, curve: &Curve, params: &BakeParams) -> Result<Mesh> {
    params.validate()?;
    curve
        .validate()
        .map_err(|e| TetherError::InvalidCurveInput(e.to_string()))?;
    if curve.bevel_depth == 0.0 && curve.extrude == 0.0 {
        return Err(TetherError::InvalidCurveInput(
            "curve has neither bevel depth nor extrude, nothing to sweep".into(),
        ));
    }

    let swept = kernel.curve_to_mesh(curve).map_err(TetherError::kernel(Stage::Bake))?;
    let unwrapped = kernel
        .unwrap_uv(&swept, params.uv_angle_limit_degrees.to_radians())
        .map_err(TetherError::kernel(Stage::Bake))?;
    let followed = kernel
        .follow_active_quads(&unwrapped, params.active_face)
        .map_err(TetherError::kernel(Stage::Bake))?;
    let mesh = kernel
        .dissolve_limited(&followed, params.decimate_angle_degrees.to_radians())
        .map_err(TetherError::kernel(Stage::Bake))?;
    debug!(
        "bake: {} swept faces, {} after dissolve",
        swept.face_count(),
        mesh.face_count()
    );
    Ok(mesh)
}
