//! Conversions between meshes and curves.

use std::f64::consts::PI;

use log::debug;
use tether_curve::{rotation_minimizing_frames, Curve, Spline};
use tether_math::{Point2, Point3};
use tether_mesh::{FaceLoop, Mesh};

use crate::error::{KernelError, Result};

/// Turn every edge chain of `mesh` into a poly spline. Closed chains give
/// cyclic splines. The curve origin is the world origin.
pub fn mesh_to_curve(mesh: &Mesh) -> Result<Curve> {
    let chains = mesh.edge_chains();
    if chains.is_empty() {
        return Err(KernelError::InvalidInput("mesh has no edges".into()));
    }
    let splines: Vec<Spline> = chains
        .iter()
        .map(|c| Spline::poly(c.vertices.iter().map(|&v| mesh.positions()[v]), c.closed))
        .collect();
    debug!(
        "mesh to curve: {} splines, {} points",
        splines.len(),
        splines.iter().map(|s| s.points.len()).sum::<usize>()
    );
    Ok(Curve::new(splines))
}

/// Sweep the curve's cross-section along each evaluated spline.
///
/// The cross-section is a stadium in frame coordinates: two half circles of
/// radius `bevel_depth` centred `extrude` either side along the binormal,
/// shifted by `offset` along the normal, with `bevel_resolution` extra
/// points per quarter circle. A zero depth gives a flat ribbon. Each ring is
/// twisted by the sample's tilt. Open splines are not capped.
pub fn curve_to_mesh(curve: &Curve) -> Result<Mesh> {
    curve.validate()?;
    let (depth, extrude) = (curve.bevel_depth, curve.extrude);
    if depth == 0.0 && extrude == 0.0 {
        return Err(KernelError::InvalidInput(
            "curve has neither bevel depth nor extrude".into(),
        ));
    }
    let (profile, profile_closed) =
        cross_section(depth, extrude, curve.offset, curve.bevel_resolution);
    let p = profile.len();
    let profile_segments = if profile_closed { p } else { p - 1 };

    let mut positions: Vec<Point3> = Vec::new();
    let mut loops: Vec<FaceLoop> = Vec::new();
    for spline in curve.evaluate() {
        let r = spline.samples.len();
        if r < 2 {
            continue;
        }
        let path: Vec<Point3> = spline.samples.iter().map(|s| s.position).collect();
        let frames = rotation_minimizing_frames(&path, spline.closed);
        let base = positions.len();
        for (frame, sample) in frames.iter().zip(&spline.samples) {
            let frame = frame.with_twist(sample.tilt);
            positions.extend(profile.iter().map(|q| frame.transform_point(q)));
        }

        let rings = if spline.closed { r } else { r - 1 };
        for i in 0..rings {
            let (a, b) = (base + i * p, base + ((i + 1) % r) * p);
            for j in 0..profile_segments {
                let k = (j + 1) % p;
                loops.push((vec![a + j, a + k, b + k, b + j], None));
            }
        }
    }

    let mesh = Mesh::from_loops_lossy(positions, loops);
    if mesh.is_empty() {
        return Err(KernelError::InvalidInput("sweep produced no faces".into()));
    }
    debug!(
        "curve to mesh: {} profile points, {} vertices, {} faces",
        p,
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Counter-clockwise stadium outline, or a two-point segment when there is
/// no bevel depth. The flag tells whether the outline is closed.
fn cross_section(depth: f64, extrude: f64, offset: f64, resolution: usize) -> (Vec<Point2>, bool) {
    if depth == 0.0 {
        return (
            vec![Point2::new(offset, -extrude), Point2::new(offset, extrude)],
            false,
        );
    }
    let half = 2 * (resolution + 1);
    let arc = |center_y: f64, start: f64| {
        (0..=half).map(move |k| {
            let theta = start + PI * k as f64 / half as f64;
            Point2::new(offset + depth * theta.cos(), center_y + depth * theta.sin())
        })
    };
    let mut points: Vec<Point2> = Vec::with_capacity(2 * half + 2);
    for q in arc(extrude, 0.0).chain(arc(-extrude, PI)) {
        if points.last().map_or(true, |last| (q - last).norm() > 1e-12 * depth) {
            points.push(q);
        }
    }
    if points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= 1e-12 * depth {
        points.pop();
    }
    (points, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tether_mesh::primitives::{cube, plane};

    fn circle_curve(n: usize, radius: f64) -> Curve {
        let pts = (0..n).map(|i| {
            let a = 2.0 * PI * i as f64 / n as f64;
            Point3::new(radius * a.cos(), radius * a.sin(), 0.0)
        });
        Curve::new(vec![Spline::poly(pts, true)])
    }

    fn radial_range(mesh: &Mesh) -> (f64, f64) {
        mesh.positions().iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            (lo.min(r), hi.max(r))
        })
    }

    #[test]
    fn test_plane_outline_becomes_cyclic_spline() {
        let curve = mesh_to_curve(&plane(1.0)).unwrap();
        assert_eq!(curve.splines.len(), 1);
        assert!(curve.splines[0].cyclic);
        assert_eq!(curve.splines[0].points.len(), 4);
    }

    #[test]
    fn test_cube_edges_become_open_splines() {
        let curve = mesh_to_curve(&cube(1.0)).unwrap();
        assert_eq!(curve.splines.len(), 12);
        assert!(curve.splines.iter().all(|s| !s.cyclic && s.points.len() == 2));
    }

    #[test]
    fn test_empty_mesh_has_no_curve() {
        assert!(mesh_to_curve(&Mesh::empty()).is_err());
    }

    #[test]
    fn test_closed_sweep_is_a_torus() {
        let mut curve = circle_curve(16, 2.0);
        curve.bevel_depth = 0.25;
        curve.bevel_resolution = 2;
        let mesh = curve_to_mesh(&curve).unwrap();
        assert_eq!(mesh.face_count(), 16 * 12);
        assert!(mesh.is_closed());
        let (lo, hi) = radial_range(&mesh);
        assert_relative_eq!(lo, 1.75, epsilon = 1e-9);
        assert_relative_eq!(hi, 2.25, epsilon = 1e-9);
        // faces point away from the swept path
        for f in mesh.faces() {
            let c = mesh.face_centroid(f);
            let on_path = Point3::new(c.x, c.y, 0.0).coords.normalize() * 2.0;
            assert!((c.coords - on_path).dot(f.normal().as_ref()) > 0.0);
        }
    }

    #[test]
    fn test_offset_shifts_profile_outward() {
        let mut curve = circle_curve(16, 2.0);
        curve.bevel_depth = 0.25;
        curve.offset = 0.1;
        let (lo, hi) = radial_range(&curve_to_mesh(&curve).unwrap());
        assert_relative_eq!(lo, 1.85, epsilon = 1e-9);
        assert_relative_eq!(hi, 2.35, epsilon = 1e-9);
    }

    #[test]
    fn test_extrude_stretches_profile_along_binormal() {
        let mut curve = circle_curve(16, 2.0);
        curve.bevel_depth = 0.25;
        curve.extrude = 0.5;
        let bounds = curve_to_mesh(&curve).unwrap().bounds().unwrap();
        assert_relative_eq!(bounds.max.z - bounds.min.z, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_open_sweep_is_uncapped() {
        let mut curve = Curve::new(vec![Spline::poly(
            (0..3).map(|i| Point3::new(i as f64, 0.0, 0.0)),
            false,
        )]);
        curve.bevel_depth = 0.1;
        curve.bevel_resolution = 0;
        let mesh = curve_to_mesh(&curve).unwrap();
        assert_eq!(mesh.face_count(), 2 * 4);
        assert!(!mesh.is_closed());
        assert_eq!(mesh.boundary_loops().len(), 2);
    }

    #[test]
    fn test_ribbon_follows_tilt() {
        let mut curve = Curve::new(vec![Spline::poly(
            (0..3).map(|i| Point3::new(i as f64, 0.0, 0.0)),
            false,
        )]);
        curve.extrude = 0.5;
        let flat = curve_to_mesh(&curve).unwrap();
        assert_eq!(flat.face_count(), 2);
        curve.set_tilt(PI / 2.0);
        let tilted = curve_to_mesh(&curve).unwrap();
        let first = |m: &Mesh| m.faces()[0].normal().into_inner();
        assert_relative_eq!(first(&flat).dot(&first(&tilted)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_depth_no_extrude_rejected() {
        assert!(matches!(
            curve_to_mesh(&circle_curve(8, 1.0)),
            Err(KernelError::InvalidInput(_))
        ));
    }
}
