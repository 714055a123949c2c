//! Convex hull of a mesh's vertex set.

use log::debug;
use parry3d_f64::transformation::try_convex_hull;
use tether_math::{Point3, Vec3};
use tether_mesh::{FaceLoop, Mesh};

use crate::error::{KernelError, Result};

/// Convex hull of every vertex of `mesh`, as outward-facing triangles.
///
/// Fails with [`KernelError::DegenerateHull`] when there are fewer than four
/// points or all of them lie on one plane (relative to the bounding box).
pub fn convex_hull(mesh: &Mesh) -> Result<Mesh> {
    let points = mesh.positions();
    check_volume(points)?;

    let (vertices, triangles) =
        try_convex_hull(points).map_err(|e| KernelError::DegenerateHull(format!("{e:?}")))?;
    if triangles.len() < 4 {
        return Err(KernelError::DegenerateHull(format!(
            "hull has only {} triangles",
            triangles.len()
        )));
    }

    let centroid = Point3::from(
        vertices.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / vertices.len() as f64,
    );
    let loops: Vec<FaceLoop> = triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.map(|i| i as usize);
            let (pa, pb, pc) = (vertices[a], vertices[b], vertices[c]);
            let normal = (pb - pa).cross(&(pc - pa));
            let outward = (Point3::from((pa.coords + pb.coords + pc.coords) / 3.0) - centroid)
                .dot(&normal)
                >= 0.0;
            let corners = if outward { vec![a, b, c] } else { vec![a, c, b] };
            (corners, None)
        })
        .collect();

    let hull = Mesh::from_loops_lossy(vertices, loops);
    debug!(
        "convex hull: {} points -> {} vertices, {} triangles",
        points.len(),
        hull.vertex_count(),
        hull.face_count()
    );
    Ok(hull)
}

/// Reject point sets that span no volume: pick two far-apart points, the
/// point farthest from their line, then the point farthest from that plane.
fn check_volume(points: &[Point3]) -> Result<()> {
    if points.len() < 4 {
        return Err(KernelError::DegenerateHull(format!(
            "{} points, need at least 4",
            points.len()
        )));
    }
    let p0 = points[0];
    let (i1, extent) = farthest(points, |p| (p - p0).norm());
    let tol = 1e-9 * extent.max(f64::MIN_POSITIVE);
    if extent <= f64::MIN_POSITIVE {
        return Err(KernelError::DegenerateHull("all points coincide".into()));
    }
    let axis = (points[i1] - p0) / extent;
    let (i2, off_line) = farthest(points, |p| {
        let d = p - p0;
        (d - axis * d.dot(&axis)).norm()
    });
    if off_line <= tol {
        return Err(KernelError::DegenerateHull("points are collinear".into()));
    }
    let normal = axis.cross(&(points[i2] - p0)).normalize();
    let (_, off_plane) = farthest(points, |p| (p - p0).dot(&normal).abs());
    if off_plane <= tol {
        return Err(KernelError::DegenerateHull("points are coplanar".into()));
    }
    Ok(())
}

fn farthest(points: &[Point3], score: impl Fn(&Point3) -> f64) -> (usize, f64) {
    points
        .iter()
        .map(score)
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tether_mesh::primitives::{cube, plane, uv_sphere};

    #[test]
    fn test_cube_hull_is_closed_and_outward() {
        let hull = convex_hull(&cube(2.0)).unwrap();
        assert!(hull.is_closed());
        assert_eq!(hull.vertex_count(), 8);
        for f in hull.faces() {
            let c = hull.face_centroid(f);
            assert!(c.coords.dot(f.normal().as_ref()) > 0.0);
        }
        let area: f64 = hull.faces().iter().map(|f| hull.face_area(f)).sum();
        assert_relative_eq!(area, 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hull_contains_sphere_vertices() {
        let sphere = uv_sphere(1.0, 12, 6);
        let hull = convex_hull(&sphere).unwrap();
        assert!(hull.is_closed());
        for f in hull.faces() {
            let on_plane = hull.positions()[f.vertices()[0]];
            for p in sphere.positions() {
                assert!((p - on_plane).dot(f.normal().as_ref()) <= 1e-9);
            }
            assert!((Point3::origin() - on_plane).dot(f.normal().as_ref()) < 0.0);
        }
    }

    #[test]
    fn test_planar_points_are_degenerate() {
        assert!(matches!(
            convex_hull(&plane(1.0)),
            Err(KernelError::DegenerateHull(_))
        ));
    }

    #[test]
    fn test_flat_prism_keeps_both_caps() {
        let base = plane(1.0);
        let mut positions = base.positions().to_vec();
        positions.extend(base.positions().iter().map(|p| p + Vec3::new(0.0, 0.0, 0.01)));
        let points = Mesh::from_loops_lossy(
            positions,
            vec![(vec![0, 1, 2, 3], None), (vec![4, 5, 6, 7], None)],
        );
        let hull = convex_hull(&points).unwrap();
        let down = hull
            .faces()
            .iter()
            .filter(|f| f.normal().z < -0.999)
            .count();
        let up = hull.faces().iter().filter(|f| f.normal().z > 0.999).count();
        assert_eq!((down, up), (2, 2));
    }
}
