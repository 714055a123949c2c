//! Rope profile synthesis: trace the footprint of a reference patch on a
//! target solid and return it as a rope curve.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tether_curve::{Curve, Dimensions, SplineKind};
use tether_kernel::{BevelOptions, KernelError, MeshKernel};
use tether_math::{angle_between, Point3, Transform};
use tether_mesh::Mesh;

use crate::classify::classify;
use crate::error::{Result, Stage, TetherError};
use crate::params::{
    SynthesisParams, BEVEL_PROFILE, BEVEL_SEGMENTS, CAP_EXTRUDE_THICKNESS, CURVE_RESOLUTION,
};

/// A small planar patch together with its object transform.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferencePatch {
    /// Patch geometry in object space.
    pub mesh: Mesh,
    /// Object transform: rotation and scale, then location.
    pub transform: Transform,
}

impl ReferencePatch {
    /// Patch with an object transform.
    pub fn new(mesh: Mesh, transform: Transform) -> Self {
        Self { mesh, transform }
    }

    /// Patch already given in world space.
    pub fn from_world(mesh: Mesh) -> Self {
        Self::new(mesh, Transform::identity())
    }
}

/// Build a rope curve along the outline where `patch` meets `target`.
///
/// The patch is first intersected with the target. Its footprint is then
/// thickened, hulled and reduced to the hull face opposite the patch
/// normal. That cap is flipped, welded and its corners beveled before the
/// outline becomes a smooth NURBS curve carrying the rope parameters. The
/// curve's origin is the patch location. Neither input is modified.
///
/// The reference normal is the normal of the patch's first face; patches
/// whose other faces are not parallel to it only produce a warning.
pub fn synthesize<K: MeshKernel>(
    kernel: &K,
    target: &Mesh,
    patch: &ReferencePatch,
    params: &SynthesisParams,
) -> Result<Curve> {
    params.validate()?;

    // 1. rotation and scale into the vertices
    let linear = patch.transform.linear_part();
    if linear.inverse().is_none() {
        return Err(TetherError::InvalidPatch("transform is singular".into()));
    }
    let baked = patch.mesh.transformed(&linear);
    debug!(
        "normalize transform: {} vertices, {} faces",
        baked.vertex_count(),
        baked.face_count()
    );

    // 2. reference normal, before the boolean touches the faces
    let reference = match baked.faces().first() {
        Some(face) => face.normal().into_inner(),
        None => return Err(TetherError::InvalidPatch("patch has no faces".into())),
    };
    let skewed = baked
        .faces()
        .iter()
        .skip(1)
        .filter(|f| angle_between(&reference, f.normal().as_ref()).is_some_and(|a| a > 1e-6))
        .count();
    if skewed > 0 {
        warn!("reference patch has {skewed} faces not parallel to its first face; using the first face normal");
    }
    debug!("capture normal: {reference:?}");

    // 3. patch ∩ target, in world space
    let location = patch.transform.translation_part();
    let world = baked.transformed(&Transform::translation(location.x, location.y, location.z));
    let section = kernel
        .intersect(&world, target)
        .map_err(TetherError::kernel(Stage::Intersect))?;
    if section.is_empty() {
        return Err(TetherError::NoIntersection);
    }
    debug!(
        "intersect: {} vertices, {} faces",
        section.vertex_count(),
        section.face_count()
    );

    // 4. hull of the thickened footprint; the cap faces away from the patch normal
    let shell = kernel
        .extrude_region(&section, CAP_EXTRUDE_THICKNESS)
        .map_err(TetherError::kernel(Stage::CapExtraction))?;
    let hull = kernel
        .convex_hull(&shell)
        .map_err(TetherError::kernel(Stage::CapExtraction))?;
    let cap = classify(&hull, &reference, params.cap_angle_tolerance);
    if cap.is_empty() {
        return Err(TetherError::NoCapFaceFound {
            tolerance: params.cap_angle_tolerance,
        });
    }
    debug!("cap extraction: {} of {} hull faces", cap.len(), hull.face_count());

    // 5. one cap face, nothing else
    let cap_mesh = if cap.len() > 1 {
        let merged = hull
            .merge_faces(&cap)
            .map_err(|e| TetherError::kernel(Stage::RimRemoval)(e.into()))?;
        let last = merged.face_count() - 1;
        merged.retain_faces(&BTreeSet::from([last]))
    } else {
        hull.retain_faces(&cap)
    };
    debug!("rim removal: {} vertices left", cap_mesh.vertex_count());

    // 6. flip, weld, bevel, weld again
    let weld_and_bevel = |mesh: &Mesh| -> std::result::Result<Mesh, KernelError> {
        let welded = kernel.weld(&mesh.flipped(), params.merge_threshold)?;
        let beveled = kernel.bevel_vertices(
            &welded,
            &BevelOptions {
                offset: params.bevel_offset,
                segments: BEVEL_SEGMENTS,
                profile: BEVEL_PROFILE,
                clamp_overlap: true,
            },
        )?;
        kernel.weld(&beveled, params.merge_threshold / 3.0)
    };
    let outline = weld_and_bevel(&cap_mesh).map_err(TetherError::kernel(Stage::WeldAndBevel))?;
    if outline.is_empty() {
        return Err(TetherError::Kernel {
            stage: Stage::WeldAndBevel,
            source: KernelError::InvalidInput(format!(
                "cap outline collapsed at merge threshold {}",
                params.merge_threshold
            )),
        });
    }
    debug!("weld and bevel: {} outline vertices", outline.vertex_count());

    // 7. outline to smooth curve
    let mut curve = kernel
        .mesh_to_curve(&outline)
        .map_err(TetherError::kernel(Stage::CurveConversion))?;
    curve.set_spline_kind(SplineKind::nurbs());
    curve.dimensions = Dimensions::Three;
    curve.resolution = CURVE_RESOLUTION;

    // 8. rope parameters
    curve.bevel_depth = params.curve_depth;
    curve.extrude = params.curve_extrude;
    curve.offset = params.rope_offset();
    curve.set_tilt(params.tilt_radians());
    curve.set_origin(Point3::from(location));
    curve
        .validate()
        .map_err(|e| TetherError::kernel(Stage::Parametrize)(e.into()))?;
    debug!(
        "parametrize: {} splines, {} control points, offset {}",
        curve.splines.len(),
        curve.point_count(),
        curve.offset
    );
    Ok(curve)
}
