//! Vertex bevel on polygon outlines.

use std::collections::HashMap;

use log::debug;
use tether_math::{Point2, Point3};
use tether_mesh::{FaceLoop, Mesh};

use crate::error::{KernelError, Result};
use crate::BevelOptions;

/// Replace every face corner by a profile of `segments` segments running
/// between the two points at `offset` along the adjacent edges.
///
/// The profile is a quadratic arc whose control point moves from the chord
/// midpoint (profile 0) through the corner (0.5) to twice the corner's
/// distance (1), which puts the middle sample on the corner. Profile points
/// are new vertices, so neighbouring corners that meet when the offset is
/// clamped to half an edge produce coincident vertices for a later weld.
///
/// Only vertices used by a single face are supported; beveling a vertex
/// shared between faces needs new connecting geometry this kernel does not
/// build.
pub fn bevel_vertices(mesh: &Mesh, options: &BevelOptions) -> Result<Mesh> {
    let BevelOptions {
        offset,
        segments,
        profile,
        clamp_overlap,
    } = *options;
    if !offset.is_finite() || offset < 0.0 {
        return Err(KernelError::InvalidInput(format!("bevel offset {offset}")));
    }
    if segments == 0 {
        return Err(KernelError::InvalidInput("bevel needs at least one segment".into()));
    }
    if !(0.0..=1.0).contains(&profile) {
        return Err(KernelError::InvalidInput(format!("bevel profile {profile}")));
    }
    if offset == 0.0 || mesh.is_empty() {
        return Ok(mesh.clone());
    }

    let mut users: HashMap<usize, usize> = HashMap::new();
    for face in mesh.faces() {
        for &v in face.vertices() {
            *users.entry(v).or_default() += 1;
        }
    }
    if let Some((v, n)) = users.iter().find(|(_, n)| **n > 1) {
        return Err(KernelError::Unsupported(format!(
            "vertex {v} is shared by {n} faces"
        )));
    }

    let positions = mesh.positions();
    let mut out_positions: Vec<Point3> = Vec::new();
    let mut loops: Vec<FaceLoop> = Vec::with_capacity(mesh.face_count());
    for face in mesh.faces() {
        let verts = face.vertices();
        let n = verts.len();
        let mut corners = Vec::with_capacity(n * (segments + 1));
        let mut uvs = face.uvs().map(|_| Vec::with_capacity(n * (segments + 1)));

        for i in 0..n {
            let (prev, cur, next) = ((i + n - 1) % n, i, (i + 1) % n);
            let p = positions[verts[cur]];
            let e_in = positions[verts[prev]] - p;
            let e_out = positions[verts[next]] - p;
            let (len_in, len_out) = (e_in.norm(), e_out.norm());
            if len_in < f64::EPSILON || len_out < f64::EPSILON {
                corners.push(out_positions.len());
                out_positions.push(p);
                if let (Some(uvs), Some(src)) = (uvs.as_mut(), face.uvs()) {
                    uvs.push(src[cur]);
                }
                continue;
            }
            let limit = if clamp_overlap {
                len_in.min(len_out) / 2.0
            } else {
                len_in.min(len_out)
            };
            let d = offset.min(limit);
            let (t_in, t_out) = (d / len_in, d / len_out);

            let a = p + e_in * t_in;
            let b = p + e_out * t_out;
            for pt in profile_points(&a, &p, &b, profile, segments) {
                corners.push(out_positions.len());
                out_positions.push(pt);
            }
            if let (Some(uvs), Some(src)) = (uvs.as_mut(), face.uvs()) {
                let c = src[cur];
                let ua = Point2::from(c.coords.lerp(&src[prev].coords, t_in));
                let ub = Point2::from(c.coords.lerp(&src[next].coords, t_out));
                uvs.extend(profile_points_2d(&ua, &c, &ub, profile, segments));
            }
        }
        loops.push((corners, uvs));
    }

    let result = Mesh::from_loops_lossy(out_positions, loops);
    debug!(
        "bevel {} faces at offset {offset}: {} -> {} vertices",
        mesh.face_count(),
        mesh.vertex_count(),
        result.vertex_count()
    );
    Ok(result)
}

/// Samples of the quadratic arc from `a` to `b` bent toward `corner`.
fn profile_points(a: &Point3, corner: &Point3, b: &Point3, profile: f64, segments: usize) -> Vec<Point3> {
    let mid = midpoint(a, b);
    let ctrl = mid + (corner - mid) * (2.0 * profile);
    (0..=segments)
        .map(|k| {
            let t = k as f64 / segments as f64;
            let s = 1.0 - t;
            Point3::from(a.coords * (s * s) + ctrl.coords * (2.0 * s * t) + b.coords * (t * t))
        })
        .collect()
}

fn profile_points_2d(a: &Point2, corner: &Point2, b: &Point2, profile: f64, segments: usize) -> Vec<Point2> {
    let mid = Point2::from((a.coords + b.coords) / 2.0);
    let ctrl = mid + (corner - mid) * (2.0 * profile);
    (0..=segments)
        .map(|k| {
            let t = k as f64 / segments as f64;
            let s = 1.0 - t;
            Point2::from(a.coords * (s * s) + ctrl.coords * (2.0 * s * t) + b.coords * (t * t))
        })
        .collect()
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tether_mesh::primitives::{cube, plane};

    fn opts(offset: f64, profile: f64) -> BevelOptions {
        BevelOptions {
            offset,
            segments: 2,
            profile,
            clamp_overlap: true,
        }
    }

    fn area(mesh: &Mesh) -> f64 {
        mesh.faces().iter().map(|f| mesh.face_area(f)).sum()
    }

    #[test]
    fn test_chamfer_cuts_corners() {
        let out = bevel_vertices(&plane(2.0), &opts(0.5, 0.0)).unwrap();
        assert_eq!(out.face_count(), 1);
        assert_relative_eq!(area(&out), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_full_profile_passes_through_corner() {
        let out = bevel_vertices(&plane(2.0), &opts(0.5, 1.0)).unwrap();
        assert_eq!(out.vertex_count(), 12);
        assert!(out
            .positions()
            .iter()
            .any(|p| (p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12));
        assert_relative_eq!(area(&out), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_profile_is_between() {
        let a = area(&bevel_vertices(&plane(2.0), &opts(0.5, 0.5)).unwrap());
        assert!(a > 3.5 && a < 4.0, "area {a}");
    }

    #[test]
    fn test_offset_is_clamped_to_half_edge() {
        let out = bevel_vertices(&plane(2.0), &opts(5.0, 0.0)).unwrap();
        // corners meet at the edge midpoints: a diamond of area 2
        assert_relative_eq!(area(&out), 2.0, epsilon = 1e-12);
        assert_eq!(out.vertex_count(), 12);
        assert_eq!(out.welded(1e-9).vertex_count(), 8);
    }

    #[test]
    fn test_shared_vertices_unsupported() {
        assert!(matches!(
            bevel_vertices(&cube(1.0), &opts(0.1, 0.5)),
            Err(KernelError::Unsupported(_))
        ));
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let p = plane(1.0);
        assert_eq!(bevel_vertices(&p, &opts(0.0, 0.5)).unwrap(), p);
    }

    #[test]
    fn test_bad_profile_rejected() {
        assert!(bevel_vertices(&plane(1.0), &opts(0.1, 1.5)).is_err());
    }
}
