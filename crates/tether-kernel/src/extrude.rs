//! Region extrusion (shrink/fatten along vertex normals).

use log::debug;
use tether_mesh::{FaceLoop, Mesh};

use crate::error::{KernelError, Result};

/// Extrude every face of `mesh` by `thickness` along the area-weighted
/// vertex normals.
///
/// The result holds the original faces reversed, the offset copies and a
/// quad wall along every boundary edge, so an open sheet becomes a closed
/// shell. A negative thickness extrudes backwards; the shell is flipped so
/// its normals still point outward.
pub fn extrude_region(mesh: &Mesh, thickness: f64) -> Result<Mesh> {
    if !thickness.is_finite() {
        return Err(KernelError::InvalidInput(format!("thickness {thickness}")));
    }
    if mesh.is_empty() {
        return Ok(Mesh::empty());
    }
    let n = mesh.vertex_count();
    let normals = mesh.vertex_normals();
    let mut positions = mesh.positions().to_vec();
    positions.extend(
        mesh.positions()
            .iter()
            .zip(&normals)
            .map(|(p, nrm)| p + nrm * thickness),
    );

    let mut loops: Vec<FaceLoop> = Vec::with_capacity(mesh.face_count() * 2);
    for face in mesh.faces() {
        let mut bottom = face.vertices().to_vec();
        bottom.reverse();
        loops.push((bottom, None));
        loops.push((face.vertices().iter().map(|v| v + n).collect(), None));
    }
    for border in mesh.boundary_loops() {
        let m = border.len();
        for i in 0..m {
            let (a, b) = (border[i], border[(i + 1) % m]);
            loops.push((vec![a, b, b + n, a + n], None));
        }
    }

    let shell = Mesh::from_loops_lossy(positions, loops);
    debug!(
        "extrude region by {thickness}: {} faces -> {} faces",
        mesh.face_count(),
        shell.face_count()
    );
    Ok(if thickness < 0.0 { shell.flipped() } else { shell })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tether_math::Vec3;
    use tether_mesh::primitives::plane;

    #[test]
    fn test_extruded_plane_is_closed_box() {
        let slab = extrude_region(&plane(2.0), 0.5).unwrap();
        assert_eq!(slab.vertex_count(), 8);
        assert_eq!(slab.face_count(), 6);
        assert!(slab.is_closed());
        let bounds = slab.bounds().unwrap();
        assert_relative_eq!(bounds.max.z, 0.5);
        assert_relative_eq!(bounds.min.z, 0.0);
    }

    #[test]
    fn test_extruded_faces_point_outward() {
        let slab = extrude_region(&plane(2.0), 0.5).unwrap();
        let center = Vec3::new(0.0, 0.0, 0.25);
        for f in slab.faces() {
            let c = slab.face_centroid(f).coords - center;
            assert!(c.dot(f.normal().as_ref()) > 0.0);
        }
    }

    #[test]
    fn test_negative_thickness_stays_outward() {
        let slab = extrude_region(&plane(2.0), -0.5).unwrap();
        assert!(slab.is_closed());
        let center = Vec3::new(0.0, 0.0, -0.25);
        for f in slab.faces() {
            let c = slab.face_centroid(f).coords - center;
            assert!(c.dot(f.normal().as_ref()) > 0.0);
        }
    }

    #[test]
    fn test_nan_thickness_rejected() {
        assert!(extrude_region(&plane(1.0), f64::NAN).is_err());
    }
}
