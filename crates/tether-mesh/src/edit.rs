//! Topology edits. Every operation borrows the input and returns a new mesh.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::trace;
use tether_spatial::KdTree;

use crate::error::{MeshError, Result};
use crate::mesh::{undirected, FaceLoop, Mesh};

/// An ordered run of vertices connected by mesh edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeChain {
    /// Vertex indices along the chain. Closed chains do not repeat the
    /// first vertex at the end.
    pub vertices: Vec<usize>,
    /// `true` if the last vertex connects back to the first.
    pub closed: bool,
}

impl Mesh {
    /// Merge vertices closer than `threshold` (remove doubles).
    ///
    /// Vertices are visited in index order; each unclaimed vertex claims
    /// every unclaimed vertex within `threshold` and keeps its own position.
    /// Collapsed corners are removed and faces left with fewer than three
    /// distinct corners are dropped.
    pub fn welded(&self, threshold: f64) -> Mesh {
        let positions = self.positions();
        let tree = match KdTree::build(positions) {
            Ok(tree) => tree,
            Err(_) => return self.clone(),
        };
        let mut target = vec![usize::MAX; positions.len()];
        let mut merged = 0usize;
        for i in 0..positions.len() {
            if target[i] != usize::MAX {
                continue;
            }
            target[i] = i;
            for j in tree.within_radius(&positions[i], threshold) {
                if target[j] == usize::MAX {
                    target[j] = i;
                    merged += 1;
                }
            }
        }
        trace!("weld at {threshold}: merged {merged} vertices");

        let loops = self
            .face_loops()
            .into_iter()
            .map(|(verts, uvs)| (verts.into_iter().map(|v| target[v]).collect(), uvs))
            .collect();
        Mesh::from_loops_lossy(positions.to_vec(), loops)
    }

    /// Keep the vertices of the faces in `keep` and delete every other
    /// vertex, together with any face that used a deleted vertex.
    pub fn retain_faces(&self, keep: &BTreeSet<usize>) -> Mesh {
        let kept_vertices: HashSet<usize> = keep
            .iter()
            .filter_map(|&fi| self.faces().get(fi))
            .flat_map(|f| f.vertices().iter().copied())
            .collect();
        let loops = self
            .face_loops()
            .into_iter()
            .filter(|(verts, _)| verts.iter().all(|v| kept_vertices.contains(v)))
            .collect();
        Mesh::from_loops_lossy(self.positions().to_vec(), loops)
    }

    /// Replace the faces in `region` by one face bounded by the region's
    /// outline. The region must be edge-connected with a single boundary
    /// loop. A region of zero or one face returns the mesh unchanged.
    pub fn merge_faces(&self, region: &BTreeSet<usize>) -> Result<Mesh> {
        if let Some(&bad) = region.iter().find(|&&f| f >= self.face_count()) {
            return Err(MeshError::FaceOutOfRange {
                face: bad,
                face_count: self.face_count(),
            });
        }
        if region.len() <= 1 {
            return Ok(self.clone());
        }

        let outline = self.region_outline(region)?;

        let mut loops: Vec<FaceLoop> = self
            .face_loops()
            .into_iter()
            .enumerate()
            .filter(|(fi, _)| !region.contains(fi))
            .map(|(_, l)| l)
            .collect();
        loops.push((outline, None));
        Mesh::with_uvs(self.positions().to_vec(), loops)
    }

    /// The single boundary loop of a face region, wound like its faces.
    pub fn region_outline(&self, region: &BTreeSet<usize>) -> Result<Vec<usize>> {
        let directed: HashSet<(usize, usize)> = region
            .iter()
            .filter_map(|&fi| self.faces().get(fi))
            .flat_map(|f| f.edges().collect::<Vec<_>>())
            .collect();
        let loops = chain_directed_edges(
            directed
                .iter()
                .copied()
                .filter(|&(a, b)| !directed.contains(&(b, a))),
        )
        .map_err(MeshError::NonSimpleRegion)?;
        match <[Vec<usize>; 1]>::try_from(loops) {
            Ok([single]) => Ok(single),
            Err(loops) => Err(MeshError::NonSimpleRegion(format!(
                "boundary has {} loops",
                loops.len()
            ))),
        }
    }

    /// Loops of directed edges that have no opposite edge, i.e. the open
    /// borders of the surface, each wound like the faces they bound.
    pub fn boundary_loops(&self) -> Vec<Vec<usize>> {
        let directed: HashSet<(usize, usize)> =
            self.faces().iter().flat_map(|f| f.edges().collect::<Vec<_>>()).collect();
        let border: Vec<(usize, usize)> = directed
            .iter()
            .copied()
            .filter(|&(a, b)| !directed.contains(&(b, a)))
            .collect();
        chain_directed_edges(border).unwrap_or_default()
    }

    /// Split the edge graph into chains between junction or end vertices
    /// and into closed cycles. Cycles start at their lowest vertex and run
    /// in face winding order where the faces define one.
    pub fn edge_chains(&self) -> Vec<EdgeChain> {
        let mut directed = HashSet::new();
        let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for face in self.faces() {
            for (a, b) in face.edges() {
                directed.insert((a, b));
                adjacency.entry(a).or_default().insert(b);
                adjacency.entry(b).or_default().insert(a);
            }
        }
        let mut used: HashSet<(usize, usize)> = HashSet::new();
        let mut chains = Vec::new();

        let step = |cur: usize, used: &HashSet<(usize, usize)>| -> Option<usize> {
            let free: Vec<usize> = adjacency
                .get(&cur)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&n| !used.contains(&undirected(cur, n)))
                .collect();
            free.iter()
                .copied()
                .find(|&n| directed.contains(&(cur, n)))
                .or_else(|| free.first().copied())
        };

        // open runs from every end or junction vertex
        let anchors: Vec<usize> = adjacency
            .iter()
            .filter(|(_, n)| n.len() != 2)
            .map(|(&v, _)| v)
            .collect();
        for &start in &anchors {
            while let Some(mut next) = step(start, &used) {
                let mut run = vec![start];
                let mut cur = start;
                loop {
                    used.insert(undirected(cur, next));
                    run.push(next);
                    cur = next;
                    if adjacency.get(&cur).map_or(0, |n| n.len()) != 2 {
                        break;
                    }
                    match step(cur, &used) {
                        Some(n) => next = n,
                        None => break,
                    }
                }
                let closed = run.len() > 2 && run.first() == run.last();
                if closed {
                    run.pop();
                }
                chains.push(EdgeChain {
                    vertices: run,
                    closed,
                });
            }
        }

        // whatever is left is made of degree-2 cycles
        for &start in adjacency.keys() {
            let Some(mut next) = step(start, &used) else {
                continue;
            };
            let mut cycle = vec![start];
            let mut cur = start;
            loop {
                used.insert(undirected(cur, next));
                if next == start {
                    break;
                }
                cycle.push(next);
                cur = next;
                match step(cur, &used) {
                    Some(n) => next = n,
                    None => break,
                }
            }
            let closed = cycle.len() > 2;
            chains.push(EdgeChain {
                vertices: cycle,
                closed,
            });
        }
        chains
    }

    /// For each face, the faces sharing an edge with it, in ascending order.
    pub fn face_neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![BTreeSet::new(); self.face_count()];
        for faces in self.edge_faces().values() {
            for &a in faces {
                for &b in faces {
                    if a != b {
                        neighbors[a].insert(b);
                    }
                }
            }
        }
        neighbors
            .into_iter()
            .map(|s| s.into_iter().collect())
            .collect()
    }
}

/// Link directed edges head to tail into closed loops.
fn chain_directed_edges(
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> std::result::Result<Vec<Vec<usize>>, String> {
    let mut next: BTreeMap<usize, usize> = BTreeMap::new();
    for (a, b) in edges {
        if next.insert(a, b).is_some() {
            return Err(format!("vertex {a} has two outgoing boundary edges"));
        }
    }
    let mut loops = Vec::new();
    while let Some((&start, _)) = next.iter().next() {
        let mut ring = vec![start];
        let mut cur = start;
        loop {
            let Some(n) = next.remove(&cur) else {
                return Err(format!("boundary is open at vertex {cur}"));
            };
            if n == start {
                break;
            }
            ring.push(n);
            cur = n;
        }
        loops.push(ring);
    }
    Ok(loops)
}
