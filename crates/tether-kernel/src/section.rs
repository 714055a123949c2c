//! Boolean intersection of a (typically planar) operand with a closed solid.
//!
//! Every operand face is intersected separately: the solid is sectioned by
//! the face plane, the section contours are chained and then clipped by the
//! face polygon. Concave or non-planar operand faces are ear-clipped first
//! so the clip polygon is always convex.

use log::debug;
use tether_math::Point2;
use tether_mesh::polygon::{PlaneFrame, Polygon};
use tether_mesh::{FaceLoop, Mesh};

use crate::error::{KernelError, Result};

/// Intersect `operand` with the closed `solid`.
///
/// The result keeps the operand's face orientation. Disjoint inputs give an
/// empty mesh. Holes in a section are not subtracted.
pub fn intersect(operand: &Mesh, solid: &Mesh) -> Result<Mesh> {
    if operand.is_empty() || solid.is_empty() {
        return Ok(Mesh::empty());
    }
    if !solid.is_closed() {
        return Err(KernelError::OpenSolid);
    }
    let (Some(a), Some(b)) = (operand.bounds(), solid.bounds()) else {
        return Ok(Mesh::empty());
    };
    if !a.overlaps(&b) {
        debug!("intersect: bounding boxes are disjoint");
        return Ok(Mesh::empty());
    }
    let scale = b.diagonal().max(1.0);
    let area_eps = 1e-12 * scale * scale;

    let mut positions = Vec::new();
    let mut loops: Vec<FaceLoop> = Vec::new();
    for face in operand.faces() {
        let frame = operand.face_frame(face);
        let mut outline = Polygon::new(
            operand
                .face_points(face)
                .iter()
                .map(|p| frame.project(p))
                .collect(),
        );
        outline.ensure_ccw();
        let planar = operand.face_planarity(face) <= 1e-9 * scale;
        let pieces: Vec<Polygon> = if planar && outline.is_convex() {
            vec![outline]
        } else {
            outline
                .triangulate()
                .into_iter()
                .map(|[i, j, k]| {
                    let mut tri =
                        Polygon::new(vec![outline.points[i], outline.points[j], outline.points[k]]);
                    tri.ensure_ccw();
                    tri
                })
                .collect()
        };

        for mut contour in section_contours(solid, &frame) {
            contour.ensure_ccw();
            for piece in &pieces {
                let mut clipped = contour.clip_convex(piece);
                clipped.dedup(1e-9 * scale);
                if clipped.len() < 3 || clipped.signed_area() <= area_eps {
                    continue;
                }
                let start = positions.len();
                positions.extend(clipped.points.iter().map(|q| frame.lift(q)));
                loops.push(((start..positions.len()).collect(), None));
            }
        }
    }

    let result = Mesh::from_loops_lossy(positions, loops).welded(1e-9 * scale);
    debug!(
        "intersect: {} operand faces -> {} faces, {} vertices",
        operand.face_count(),
        result.face_count(),
        result.vertex_count()
    );
    Ok(result)
}

/// Section `solid` with the plane of `frame`, returning the cross-section
/// contours in the frame's 2D coordinates.
///
/// Triangle edges lying in the plane contribute only when the triangle's
/// third corner is below the plane, so an edge shared by a crossing pair
/// is emitted once.
pub fn section_contours(solid: &Mesh, frame: &PlaneFrame) -> Vec<Polygon> {
    let scale = solid.bounds().map_or(1.0, |b| b.diagonal().max(1.0));
    let eps = 1e-10 * scale;
    let heights: Vec<f64> = solid.positions().iter().map(|p| frame.height(p)).collect();

    let mut segments: Vec<(Point2, Point2)> = Vec::new();
    for tri in solid.triangles() {
        let d = tri.map(|v| heights[v]);
        if d.iter().all(|h| *h > eps) || d.iter().all(|h| *h < -eps) {
            continue;
        }
        if let Some(seg) = triangle_plane_intersection(solid, frame, tri, d, eps) {
            segments.push(seg);
        }
    }
    chain_segments(segments, 1e-7 * scale)
}

fn triangle_plane_intersection(
    solid: &Mesh,
    frame: &PlaneFrame,
    tri: [usize; 3],
    d: [f64; 3],
    eps: f64,
) -> Option<(Point2, Point2)> {
    let on: Vec<bool> = d.iter().map(|h| h.abs() <= eps).collect();
    match on.iter().filter(|o| **o).count() {
        3 => return None,
        2 => {
            let off = on.iter().position(|o| !o)?;
            if d[off] > 0.0 {
                return None;
            }
        }
        _ => {}
    }

    let p = tri.map(|v| solid.positions()[v]);
    let mut points: Vec<Point2> = Vec::with_capacity(2);
    for (ia, ib) in [(0, 1), (1, 2), (2, 0)] {
        let (da, db) = (d[ia], d[ib]);
        if (da > eps && db < -eps) || (da < -eps && db > eps) {
            let t = da / (da - db);
            points.push(frame.project(&(p[ia] + (p[ib] - p[ia]) * t)));
        } else if on[ia] && !on[ib] {
            points.push(frame.project(&p[ia]));
        } else if on[ib] && !on[ia] {
            points.push(frame.project(&p[ib]));
        }
    }
    points.dedup_by(|a, b| (*a - *b).norm() < eps);
    if points.len() >= 2 && (points[0] - points[1]).norm() >= eps {
        Some((points[0], points[1]))
    } else {
        None
    }
}

/// Chain segments into polygons by matching end points within `eps`.
fn chain_segments(segments: Vec<(Point2, Point2)>, eps: f64) -> Vec<Polygon> {
    let mut remaining = segments;
    let mut contours = Vec::new();

    while let Some((start, end)) = remaining.pop() {
        let mut chain = vec![start, end];
        let mut changed = true;
        while changed {
            changed = false;
            let (head, tail) = (chain[0], chain[chain.len() - 1]);
            let mut i = 0;
            while i < remaining.len() {
                let (a, b) = remaining[i];
                if (b - tail).norm() < eps {
                    chain.push(a);
                } else if (a - tail).norm() < eps {
                    chain.push(b);
                } else if (b - head).norm() < eps {
                    chain.insert(0, a);
                } else if (a - head).norm() < eps {
                    chain.insert(0, b);
                } else {
                    i += 1;
                    continue;
                }
                remaining.swap_remove(i);
                changed = true;
                break;
            }
        }

        if chain.len() >= 3 && (chain[0] - chain[chain.len() - 1]).norm() < eps {
            chain.pop();
        }
        if chain.len() >= 3 {
            contours.push(Polygon::new(chain));
        }
    }

    contours.sort_by(|a, b| b.signed_area().abs().total_cmp(&a.signed_area().abs()));
    contours
}
