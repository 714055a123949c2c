//! Limited dissolve: merge nearly coplanar faces, then drop vertices that
//! only continue a straight edge.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use log::{debug, trace};
use tether_math::{angle_between, Point2};
use tether_mesh::{Face, FaceLoop, Mesh};

use crate::error::{KernelError, Result};

/// Dissolve faces and vertices within `angle_limit` radians.
///
/// Regions grow breadth-first from the lowest unassigned face across shared
/// edges whose far face stays within `angle_limit` of the seed normal and
/// whose corner UVs agree on both sides. A region becomes one face when its
/// boundary is a single loop; otherwise its faces are kept. Afterwards every
/// vertex joining exactly two edges that bend less than `angle_limit` is
/// removed, unless a face would drop below three corners.
pub fn dissolve_limited(mesh: &Mesh, angle_limit: f64) -> Result<Mesh> {
    if !angle_limit.is_finite() || angle_limit < 0.0 {
        return Err(KernelError::InvalidInput(format!("angle limit {angle_limit}")));
    }
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }

    let mut loops: Vec<FaceLoop> = Vec::with_capacity(mesh.face_count());
    let mut merged = 0usize;
    for region in grow_regions(mesh, angle_limit) {
        if region.len() > 1 {
            if let Ok(outline) = mesh.region_outline(&region) {
                let uvs = region_uvs(mesh, &region, &outline);
                loops.push((outline, uvs));
                merged += region.len() - 1;
                continue;
            }
            trace!("region of {} faces has no single outline, kept", region.len());
        }
        loops.extend(region.iter().map(|&fi| {
            let f = &mesh.faces()[fi];
            (f.vertices().to_vec(), f.uvs().map(<[Point2]>::to_vec))
        }));
    }

    let removed = dissolve_straight_vertices(mesh, &mut loops, angle_limit);
    let result = Mesh::from_loops_lossy(mesh.positions().to_vec(), loops);
    debug!(
        "limited dissolve at {:.1} degrees: merged {merged} faces, removed {removed} vertices, {} faces left",
        angle_limit.to_degrees(),
        result.face_count()
    );
    Ok(result)
}

fn grow_regions(mesh: &Mesh, angle_limit: f64) -> Vec<BTreeSet<usize>> {
    let edge_faces = mesh.edge_faces();
    let mut assigned = vec![false; mesh.face_count()];
    let mut regions = Vec::new();
    for seed in 0..mesh.face_count() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let seed_normal = mesh.faces()[seed].normal().into_inner();
        let mut region = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(fi) = queue.pop_front() {
            let f = &mesh.faces()[fi];
            for (a, b) in f.edges() {
                let key = if a < b { (a, b) } else { (b, a) };
                for &gi in edge_faces.get(&key).into_iter().flatten() {
                    if assigned[gi] {
                        continue;
                    }
                    let g = &mesh.faces()[gi];
                    let flat = angle_between(&seed_normal, g.normal().as_ref())
                        .is_some_and(|angle| angle <= angle_limit);
                    if flat && !is_seam(f, g, a, b) {
                        assigned[gi] = true;
                        region.insert(gi);
                        queue.push_back(gi);
                    }
                }
            }
        }
        regions.push(region);
    }
    regions
}

fn corner_uv(face: &Face, vertex: usize) -> Option<Point2> {
    let i = face.vertices().iter().position(|&v| v == vertex)?;
    face.uvs().map(|uvs| uvs[i])
}

/// UVs disagree across the edge `(a, b)`, or only one side has UVs.
fn is_seam(f: &Face, g: &Face, a: usize, b: usize) -> bool {
    match (f.uvs(), g.uvs()) {
        (None, None) => false,
        (Some(_), Some(_)) => [a, b].iter().any(|&v| match (corner_uv(f, v), corner_uv(g, v)) {
            (Some(p), Some(q)) => (p - q).norm() > 1e-9,
            _ => true,
        }),
        _ => true,
    }
}

fn region_uvs(mesh: &Mesh, region: &BTreeSet<usize>, outline: &[usize]) -> Option<Vec<Point2>> {
    let mut by_vertex: HashMap<usize, Point2> = HashMap::new();
    for &fi in region {
        let f = &mesh.faces()[fi];
        let uvs = f.uvs()?;
        for (&v, &uv) in f.vertices().iter().zip(uvs) {
            by_vertex.entry(v).or_insert(uv);
        }
    }
    outline.iter().map(|v| by_vertex.get(v).copied()).collect()
}

/// Remove vertices with exactly two neighbours whose edges continue within
/// `angle_limit`. Returns the number removed.
fn dissolve_straight_vertices(mesh: &Mesh, loops: &mut [FaceLoop], angle_limit: f64) -> usize {
    let positions = mesh.positions();
    let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    let mut users: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (li, (verts, _)) in loops.iter().enumerate() {
        let n = verts.len();
        for i in 0..n {
            let (a, b) = (verts[i], verts[(i + 1) % n]);
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
            users.entry(a).or_default().push(li);
        }
    }

    let mut removed = 0;
    let candidates: Vec<usize> = adjacency.keys().copied().collect();
    for v in candidates {
        let Some(neighbors) = adjacency.get(&v) else {
            continue;
        };
        let &[p, q] = neighbors.iter().collect::<Vec<_>>().as_slice() else {
            continue;
        };
        let (p, q) = (*p, *q);
        let bend = angle_between(&(positions[v] - positions[p]), &(positions[q] - positions[v]));
        if !bend.is_some_and(|b| b <= angle_limit) {
            continue;
        }
        let faces = users.get(&v).cloned().unwrap_or_default();
        if faces.iter().any(|&li| loops[li].0.len() <= 3) {
            continue;
        }
        for li in faces {
            let (verts, uvs) = &mut loops[li];
            if let Some(i) = verts.iter().position(|&x| x == v) {
                verts.remove(i);
                if let Some(uvs) = uvs {
                    uvs.remove(i);
                }
            }
        }
        adjacency.remove(&v);
        for (x, y) in [(p, q), (q, p)] {
            if let Some(set) = adjacency.get_mut(&x) {
                set.remove(&v);
                set.insert(y);
            }
        }
        removed += 1;
    }
    removed
}
