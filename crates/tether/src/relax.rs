//! Curve relaxation: snap control points onto a target surface.

use log::{debug, trace, warn};
use tether_curve::Curve;
use tether_math::Point3;
use tether_mesh::Mesh;
use tether_spatial::KdTree;

use crate::error::{Result, TetherError};
use crate::params::RelaxParams;

/// Move every control point of `curve` onto the nearest vertex of `target`
/// and scale its handles.
///
/// The target is in world space; the curve's points are taken relative to
/// its origin. With a non-zero `surface_offset` the target vertices are
/// first pushed along their area-weighted normals. A handle `h` of a point
/// moved from `p` to `q` becomes `q + handle_scale * (h - p)`. The origin is
/// finally moved to the centre of the control points.
///
/// Snapping is to the nearest vertex, not to the nearest point on a face,
/// so a coarse target gives a coarse result.
pub fn relax(curve: &Curve, target: &Mesh, params: &RelaxParams) -> Result<Curve> {
    params.validate()?;
    curve
        .validate()
        .map_err(|e| TetherError::InvalidCurveInput(e.to_string()))?;
    if target.vertex_count() == 0 {
        return Err(TetherError::InsufficientTargetGeometry { vertices: 0 });
    }
    if !target.is_closed() {
        warn!("relax: target surface is not closed");
    }

    let snap_points: Vec<Point3> = if params.surface_offset == 0.0 {
        target.positions().to_vec()
    } else {
        target
            .positions()
            .iter()
            .zip(target.vertex_normals())
            .map(|(p, n)| p + n * params.surface_offset)
            .collect()
    };
    let index = KdTree::build(&snap_points)?;

    let mut out = curve.clone();
    let origin = out.origin.coords;
    let scale = params.handle_scale;
    for point in out.points_mut() {
        let before = point.position;
        let hit = index.nearest(&(before + origin));
        let after = hit.point - origin;
        trace!("snap {before} -> vertex {} at distance {}", hit.id, hit.distance);
        for handle in [&mut point.handle_left, &mut point.handle_right].into_iter().flatten() {
            *handle = after + (*handle - before) * scale;
        }
        point.position = after;
    }
    out.recenter_origin();
    debug!(
        "relaxed {} control points onto {} target vertices",
        out.point_count(),
        snap_points.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use tether_curve::{ControlPoint, Spline, SplineKind};
    use tether_math::Vec3;
    use tether_mesh::primitives::{cube, uv_sphere};

    fn bezier_curve(points: &[[f64; 3]]) -> Curve {
        let points = points
            .iter()
            .map(|c| {
                let p = Point3::new(c[0], c[1], c[2]);
                ControlPoint::with_handles(p, p - Vec3::x() * 0.5, p + Vec3::x() * 0.5)
            })
            .collect();
        Curve::new(vec![Spline {
            kind: SplineKind::Bezier,
            points,
            cyclic: false,
        }])
    }

    #[test]
    fn test_points_snap_to_nearest_vertex() {
        let curve = bezier_curve(&[[0.6, 0.6, 0.7], [-0.4, -0.6, -0.55]]);
        let out = relax(&curve, &cube(1.0), &RelaxParams::default()).unwrap();
        let world = out.world_points();
        assert_relative_eq!(world[0], Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(world[1], Point3::new(-0.5, -0.5, -0.5), epsilon = 1e-12);
        assert_relative_eq!(out.origin, Point3::origin(), epsilon = 1e-12);
    }

    #[test]
    fn test_handles_follow_formula() {
        let curve = bezier_curve(&[[0.6, 0.6, 0.7]]);
        let params = RelaxParams {
            handle_scale: 0.5,
            ..Default::default()
        };
        let out = relax(&curve, &cube(1.0), &params).unwrap();
        let p = &out.splines[0].points[0];
        let right = p.handle_right.unwrap() - p.position;
        assert_relative_eq!(right, Vec3::new(0.25, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_relax_is_idempotent_on_surface() {
        let target = uv_sphere(1.0, 16, 8);
        let curve = bezier_curve(&[[0.9, 0.1, 0.2], [0.1, 0.95, -0.1], [-0.3, 0.2, 0.8]]);
        let once = relax(&curve, &target, &RelaxParams::default()).unwrap();
        let twice = relax(&once, &target, &RelaxParams::default()).unwrap();
        for (a, b) in once.world_points().iter().zip(twice.world_points()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_surface_offset_lifts_points() {
        let target = uv_sphere(1.0, 16, 8);
        let curve = bezier_curve(&[[0.0, 0.0, 2.0]]);
        let params = RelaxParams {
            surface_offset: 0.25,
            ..Default::default()
        };
        let out = relax(&curve, &target, &params).unwrap();
        assert_relative_eq!(out.world_points()[0], Point3::new(0.0, 0.0, 1.25), epsilon = 1e-9);
    }

    #[test]
    fn test_input_curve_is_untouched() {
        let curve = bezier_curve(&[[0.6, 0.6, 0.7]]);
        let before = curve.clone();
        relax(&curve, &cube(1.0), &RelaxParams::default()).unwrap();
        assert_eq!(curve, before);
    }

    #[test]
    fn test_empty_target_fails() {
        let curve = bezier_curve(&[[0.0, 0.0, 0.0]]);
        assert!(matches!(
            relax(&curve, &Mesh::empty(), &RelaxParams::default()),
            Err(TetherError::InsufficientTargetGeometry { vertices: 0 })
        ));
    }

    #[test]
    fn test_empty_curve_fails() {
        assert!(matches!(
            relax(&Curve::default(), &cube(1.0), &RelaxParams::default()),
            Err(TetherError::InvalidCurveInput(_))
        ));
    }

    proptest! {
        #[test]
        fn test_relax_is_idempotent_for_any_curve(
            coords in prop::collection::vec((-1.5f64..1.5, -1.5f64..1.5, -1.5f64..1.5), 1..12),
            handle_scale in 0.1f64..2.0,
        ) {
            let target = uv_sphere(1.0, 12, 6);
            let points: Vec<[f64; 3]> = coords.iter().map(|&(x, y, z)| [x, y, z]).collect();
            let params = RelaxParams { handle_scale, ..Default::default() };
            let once = relax(&bezier_curve(&points), &target, &params).unwrap();
            let twice = relax(&once, &target, &RelaxParams::default()).unwrap();
            for (a, b) in once.world_points().iter().zip(twice.world_points()) {
                prop_assert!((a - b).norm() < 1e-12);
            }
        }
    }
}
