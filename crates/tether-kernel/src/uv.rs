//! UV unwrapping: angle-limited chart projection with shelf packing, and
//! propagation of an active quad's layout across a quad strip.

use std::collections::VecDeque;

use log::{debug, trace};
use tether_math::{angle_between, Dir3, Point2, Vec2, Vec3};
use tether_mesh::polygon::PlaneFrame;
use tether_mesh::{undirected, Mesh};

use crate::error::{KernelError, Result};

/// A group of faces projected onto one plane.
struct Chart {
    faces: Vec<usize>,
    uvs: Vec<Vec<Point2>>,
    size: Vec2,
}

/// Angle-limited automatic unwrap.
///
/// Faces are grown into charts breadth-first from the lowest unassigned
/// face; a neighbour joins when its normal is within `angle_limit` of the
/// chart seed's normal. Each chart is projected along its area-weighted
/// mean normal, and the charts are shelf-packed (tallest first) into the
/// unit square with a uniform scale, so relative texel density is kept.
pub fn unwrap_uv(mesh: &Mesh, angle_limit: f64) -> Result<Mesh> {
    if !angle_limit.is_finite() || angle_limit <= 0.0 {
        return Err(KernelError::InvalidInput(format!("angle limit {angle_limit}")));
    }
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }
    let charts: Vec<Chart> = grow_charts(mesh, angle_limit)
        .into_iter()
        .map(|faces| project_chart(mesh, faces))
        .collect();
    let placed = shelf_pack(&charts);

    let mut out = mesh.clone();
    for (chart, (offset, scale)) in charts.iter().zip(placed) {
        for (&fi, uvs) in chart.faces.iter().zip(&chart.uvs) {
            let packed = uvs
                .iter()
                .map(|uv| Point2::from((uv.coords + offset) * scale))
                .collect();
            out.set_face_uvs(fi, packed)?;
        }
    }
    debug!(
        "unwrap: {} faces in {} charts at {:.1} degrees",
        mesh.face_count(),
        charts.len(),
        angle_limit.to_degrees()
    );
    Ok(out)
}

fn grow_charts(mesh: &Mesh, angle_limit: f64) -> Vec<Vec<usize>> {
    let neighbors = mesh.face_neighbors();
    let mut assigned = vec![false; mesh.face_count()];
    let mut charts = Vec::new();
    for seed in 0..mesh.face_count() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let seed_normal = mesh.faces()[seed].normal().into_inner();
        let mut faces = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(f) = queue.pop_front() {
            for &g in &neighbors[f] {
                if assigned[g] {
                    continue;
                }
                let normal = mesh.faces()[g].normal().into_inner();
                if angle_between(&seed_normal, &normal).is_some_and(|a| a <= angle_limit) {
                    assigned[g] = true;
                    faces.push(g);
                    queue.push_back(g);
                }
            }
        }
        charts.push(faces);
    }
    charts
}

fn project_chart(mesh: &Mesh, faces: Vec<usize>) -> Chart {
    let seed = &mesh.faces()[faces[0]];
    let weighted = faces.iter().fold(Vec3::zeros(), |acc, &fi| {
        let f = &mesh.faces()[fi];
        acc + f.normal().as_ref() * mesh.face_area(f)
    });
    let normal = if weighted.norm() > 1e-12 {
        Dir3::new_normalize(weighted)
    } else {
        *seed.normal()
    };
    let frame = PlaneFrame::new(mesh.positions()[seed.vertices()[0]], normal);

    let mut uvs: Vec<Vec<Point2>> = faces
        .iter()
        .map(|&fi| {
            mesh.faces()[fi]
                .vertices()
                .iter()
                .map(|&v| frame.project(&mesh.positions()[v]))
                .collect()
        })
        .collect();
    let (mut min, mut max) = (Vec2::repeat(f64::MAX), Vec2::repeat(f64::MIN));
    for uv in uvs.iter().flatten() {
        min = min.inf(&uv.coords);
        max = max.sup(&uv.coords);
    }
    for uv in uvs.iter_mut().flatten() {
        uv.coords -= min;
    }
    Chart {
        faces,
        uvs,
        size: max - min,
    }
}

/// Offset of every chart plus the common scale that fits the layout into
/// the unit square.
fn shelf_pack(charts: &[Chart]) -> Vec<(Vec2, f64)> {
    let total: f64 = charts.iter().map(|c| c.size.x * c.size.y).sum();
    let widest = charts.iter().map(|c| c.size.x).fold(0.0, f64::max);
    let row_limit = total.sqrt().max(widest);

    let mut order: Vec<usize> = (0..charts.len()).collect();
    order.sort_by(|&a, &b| charts[b].size.y.total_cmp(&charts[a].size.y));

    let mut offsets = vec![Vec2::zeros(); charts.len()];
    let (mut x, mut y, mut row_height) = (0.0, 0.0, 0.0f64);
    let mut extent = 0.0f64;
    for ci in order {
        let size = charts[ci].size;
        if x > 0.0 && x + size.x > row_limit {
            y += row_height;
            x = 0.0;
            row_height = 0.0;
        }
        offsets[ci] = Vec2::new(x, y);
        x += size.x;
        row_height = row_height.max(size.y);
        extent = extent.max(x).max(y + size.y);
    }
    trace!("shelf pack: {} charts, extent {extent}", charts.len());
    let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
    offsets.into_iter().map(|o| (o, scale)).collect()
}

/// Propagate the UVs of the quad `active_face` over every quad reachable
/// through shared edges.
///
/// Crossing the edge `(a, b)` of a laid-out quad, the far corners of the
/// neighbour continue the rails through `a` and `b`, stretched by the ratio
/// of the average rail lengths on both sides. A quad keeps the layout of
/// the first visit. Non-quad faces keep their UVs. If the active face has
/// no UVs it is projected onto its own plane first.
pub fn follow_active_quads(mesh: &Mesh, active_face: usize) -> Result<Mesh> {
    let active = mesh.face(active_face)?;
    if active.len() != 4 {
        return Err(KernelError::InvalidInput(format!(
            "active face {active_face} has {} corners, expected a quad",
            active.len()
        )));
    }
    let mut layout: Vec<Option<Vec<Point2>>> = vec![None; mesh.face_count()];
    layout[active_face] = Some(match active.uvs() {
        Some(uvs) => uvs.to_vec(),
        None => {
            let frame = mesh.face_frame(active);
            mesh.face_points(active).iter().map(|p| frame.project(p)).collect()
        }
    });

    let edge_faces = mesh.edge_faces();
    let positions = mesh.positions();
    let mut queue = VecDeque::from([active_face]);
    let mut reached = 1usize;
    while let Some(fi) = queue.pop_front() {
        let f = mesh.faces()[fi].vertices();
        let Some(f_uv) = layout[fi].clone() else {
            continue;
        };
        for i in 0..4 {
            let (a, b, c, d) = (f[i], f[(i + 1) % 4], f[(i + 2) % 4], f[(i + 3) % 4]);
            let Some(shared) = edge_faces.get(&undirected(a, b)) else {
                continue;
            };
            for &gi in shared {
                let g = mesh.faces()[gi].vertices();
                if gi == fi || layout[gi].is_some() || g.len() != 4 {
                    continue;
                }
                let Some((e, h)) = far_corners(g, a, b) else {
                    continue;
                };
                let near = ((positions[a] - positions[d]).norm() + (positions[b] - positions[c]).norm()) / 2.0;
                let far = ((positions[e] - positions[a]).norm() + (positions[h] - positions[b]).norm()) / 2.0;
                let ratio = if near > 1e-12 { far / near } else { 1.0 };

                let (uv_a, uv_b) = (f_uv[i], f_uv[(i + 1) % 4]);
                let (uv_c, uv_d) = (f_uv[(i + 2) % 4], f_uv[(i + 3) % 4]);
                let uv_e = uv_a + (uv_a - uv_d) * ratio;
                let uv_h = uv_b + (uv_b - uv_c) * ratio;
                let corner_uv = |v: usize| match v {
                    v if v == a => uv_a,
                    v if v == b => uv_b,
                    v if v == e => uv_e,
                    _ => uv_h,
                };
                layout[gi] = Some(g.iter().map(|&v| corner_uv(v)).collect());
                reached += 1;
                queue.push_back(gi);
            }
        }
    }

    let mut out = mesh.clone();
    for (fi, uvs) in layout.into_iter().enumerate() {
        if let Some(uvs) = uvs {
            out.set_face_uvs(fi, uvs)?;
        }
    }
    debug!("follow active quads from face {active_face}: {reached} quads laid out");
    Ok(out)
}

/// In quad `g` sharing edge `(a, b)`, the corner next to `a` and the corner
/// next to `b` that are not on the shared edge. Works for either winding.
fn far_corners(g: &[usize], a: usize, b: usize) -> Option<(usize, usize)> {
    let ga = g.iter().position(|&v| v == a)?;
    let gb = g.iter().position(|&v| v == b)?;
    if (gb + 1) % 4 == ga {
        Some((g[(ga + 1) % 4], g[(gb + 3) % 4]))
    } else if (ga + 1) % 4 == gb {
        Some((g[(ga + 3) % 4], g[(gb + 1) % 4]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tether_math::Point3;
    use tether_mesh::primitives::{cube, plane};
    use tether_mesh::MeshError;

    /// A strip of `n` unit quads along X.
    fn strip(n: usize) -> Mesh {
        let mut positions = Vec::new();
        for j in 0..2 {
            for i in 0..=n {
                positions.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let row = n + 1;
        let faces = (0..n).map(|i| vec![i, i + 1, i + 1 + row, i + row]).collect();
        Mesh::new(positions, faces).unwrap()
    }

    fn uv_area(uvs: &[Point2]) -> f64 {
        let n = uvs.len();
        (0..n)
            .map(|i| {
                let (p, q) = (uvs[i], uvs[(i + 1) % n]);
                p.x * q.y - q.x * p.y
            })
            .sum::<f64>()
            / 2.0
    }

    #[test]
    fn test_cube_unwraps_into_six_charts() {
        let out = unwrap_uv(&cube(2.0), 60f64.to_radians()).unwrap();
        let areas: Vec<f64> = out.faces().iter().map(|f| uv_area(f.uvs().unwrap()).abs()).collect();
        for a in &areas {
            assert_relative_eq!(*a, areas[0], epsilon = 1e-9);
            assert!(*a > 0.0);
        }
        for uv in out.faces().iter().flat_map(|f| f.uvs().unwrap()) {
            assert!((-1e-12..=1.0 + 1e-12).contains(&uv.x));
            assert!((-1e-12..=1.0 + 1e-12).contains(&uv.y));
        }
    }

    #[test]
    fn test_single_chart_fills_unit_square() {
        let out = unwrap_uv(&plane(3.0), 1.0).unwrap();
        let uvs = out.faces()[0].uvs().unwrap();
        let max = uvs.iter().fold(0.0f64, |m, uv| m.max(uv.x).max(uv.y));
        assert_relative_eq!(max, 1.0, epsilon = 1e-12);
        assert_relative_eq!(uv_area(uvs), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unwrap_keeps_geometry() {
        let c = cube(1.0);
        let out = unwrap_uv(&c, 1.0).unwrap();
        assert_eq!(out.positions(), c.positions());
        assert_eq!(out.face_count(), c.face_count());
    }

    #[test]
    fn test_follow_quads_extends_strip() {
        let mut mesh = strip(3);
        let active_uvs: Vec<Point2> = mesh.face_points(&mesh.faces()[0]).iter().map(|p| Point2::new(p.x, p.y)).collect();
        mesh.set_face_uvs(0, active_uvs).unwrap();
        let out = follow_active_quads(&mesh, 0).unwrap();
        for f in out.faces() {
            let uvs = f.uvs().unwrap();
            for (uv, &v) in uvs.iter().zip(f.vertices()) {
                let p = out.positions()[v];
                assert_relative_eq!(uv.x, p.x, epsilon = 1e-12);
                assert_relative_eq!(uv.y, p.y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_follow_quads_projects_missing_active_uvs() {
        let out = follow_active_quads(&strip(2), 1).unwrap();
        assert!(out.faces().iter().all(|f| f.uvs().is_some()));
        let a0 = uv_area(out.faces()[0].uvs().unwrap()).abs();
        assert_relative_eq!(a0, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_follow_quads_active_out_of_range() {
        assert_eq!(
            follow_active_quads(&strip(2), 5),
            Err(KernelError::Mesh(MeshError::FaceOutOfRange {
                face: 5,
                face_count: 2
            }))
        );
    }

    #[test]
    fn test_follow_quads_needs_quad() {
        let tri = Mesh::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![vec![0, 1, 2]],
        )
        .unwrap();
        assert!(matches!(
            follow_active_quads(&tri, 0),
            Err(KernelError::InvalidInput(_))
        ));
    }
}
