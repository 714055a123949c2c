//! The polygon mesh value type.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tether_math::{Aabb3, Dir3, Point2, Point3, Transform, Vec3};

use crate::error::{MeshError, Result};
use crate::polygon::{PlaneFrame, Polygon};

/// One polygon of a [`Mesh`].
///
/// Corners are listed counter-clockwise when viewed from the side the
/// normal points to.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    vertices: Vec<usize>,
    normal: Dir3,
    uvs: Option<Vec<Point2>>,
}

impl Face {
    /// Vertex indices of the loop.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Unit normal (Newell's method).
    pub fn normal(&self) -> &Dir3 {
        &self.normal
    }

    /// Per-corner texture coordinates, if the face has been unwrapped.
    pub fn uvs(&self) -> Option<&[Point2]> {
        self.uvs.as_deref()
    }

    /// Number of corners.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always `false` for a validated face.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Directed edges `(a, b)` of the loop, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// A polygon mesh: vertex positions plus faces given as vertex loops.
///
/// Edges are implicit in the face loops. Every face references valid
/// vertices and carries a unit normal; operations that change topology
/// return a new mesh with normals recomputed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawMesh", into = "RawMesh")]
pub struct Mesh {
    positions: Vec<Point3>,
    faces: Vec<Face>,
}

/// A face loop with optional per-corner UVs, the input form of a face.
pub type FaceLoop = (Vec<usize>, Option<Vec<Point2>>);

impl Mesh {
    /// Build a mesh from positions and face loops.
    ///
    /// Fails on out-of-range indices, non-finite positions, and faces with
    /// fewer than three distinct corners or zero area.
    pub fn new(positions: Vec<Point3>, faces: Vec<Vec<usize>>) -> Result<Self> {
        Self::with_uvs(positions, faces.into_iter().map(|f| (f, None)).collect())
    }

    /// Like [`Mesh::new`], with optional per-corner UVs for each face.
    pub fn with_uvs(positions: Vec<Point3>, faces: Vec<FaceLoop>) -> Result<Self> {
        if let Some(bad) = positions
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(MeshError::NonFinitePosition(bad));
        }
        let mut out = Vec::with_capacity(faces.len());
        for (fi, (vertices, uvs)) in faces.into_iter().enumerate() {
            if let Some(&index) = vertices.iter().find(|&&v| v >= positions.len()) {
                return Err(MeshError::InvalidIndex {
                    face: fi,
                    index,
                    vertex_count: positions.len(),
                });
            }
            if let Some(uv) = &uvs {
                if uv.len() != vertices.len() {
                    return Err(MeshError::UvLengthMismatch {
                        face: fi,
                        corners: vertices.len(),
                        uvs: uv.len(),
                    });
                }
            }
            let normal = loop_normal(&positions, &vertices).ok_or(MeshError::DegenerateFace(fi))?;
            out.push(Face {
                vertices,
                normal,
                uvs,
            });
        }
        Ok(Self {
            positions,
            faces: out,
        })
    }

    /// Build a mesh, dropping repeated corners, degenerate or out-of-range
    /// faces and vertices no face uses. Operations that can collapse
    /// corners build their result through here.
    pub fn from_loops_lossy(positions: Vec<Point3>, faces: Vec<FaceLoop>) -> Self {
        let mut kept = Vec::with_capacity(faces.len());
        for (mut vertices, mut uvs) in faces {
            remove_repeated_corners(&mut vertices, uvs.as_mut());
            if vertices.len() < 3 || vertices.iter().any(|&v| v >= positions.len()) {
                continue;
            }
            if let Some(normal) = loop_normal(&positions, &vertices) {
                let uvs = uvs.filter(|u| u.len() == vertices.len());
                kept.push(Face {
                    vertices,
                    normal,
                    uvs,
                });
            }
        }
        Self {
            positions,
            faces: kept,
        }
        .compacted()
    }

    /// A mesh with no vertices and no faces.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Faces.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Face by index.
    pub fn face(&self, index: usize) -> Result<&Face> {
        self.faces.get(index).ok_or(MeshError::FaceOutOfRange {
            face: index,
            face_count: self.faces.len(),
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// `true` if the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Corner positions of a face, in loop order.
    pub fn face_points(&self, face: &Face) -> Vec<Point3> {
        face.vertices.iter().map(|&v| self.positions[v]).collect()
    }

    /// Area of a face.
    pub fn face_area(&self, face: &Face) -> f64 {
        newell(&self.positions, &face.vertices).norm() / 2.0
    }

    /// Arithmetic mean of a face's corners.
    pub fn face_centroid(&self, face: &Face) -> Point3 {
        let sum = face
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, &v| acc + self.positions[v].coords);
        Point3::from(sum / face.vertices.len() as f64)
    }

    /// Largest distance of any face corner from the face's best-fit plane.
    pub fn face_planarity(&self, face: &Face) -> f64 {
        let c = self.face_centroid(face);
        face.vertices
            .iter()
            .map(|&v| (self.positions[v] - c).dot(face.normal.as_ref()).abs())
            .fold(0.0, f64::max)
    }

    /// Plane frame of a face, centred on its centroid.
    pub fn face_frame(&self, face: &Face) -> PlaneFrame {
        PlaneFrame::new(self.face_centroid(face), face.normal)
    }

    /// Bounding box of all vertices, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb3> {
        Aabb3::from_points(self.positions.iter())
    }

    /// Area-weighted vertex normals. Vertices no face uses get a zero vector.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::zeros(); self.positions.len()];
        for face in &self.faces {
            let weighted = newell(&self.positions, &face.vertices) / 2.0;
            for &v in &face.vertices {
                normals[v] += weighted;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > 0.0 {
                *n /= len;
            }
        }
        normals
    }

    /// Undirected edge to incident faces.
    pub fn edge_faces(&self) -> BTreeMap<(usize, usize), Vec<usize>> {
        let mut map: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for (fi, face) in self.faces.iter().enumerate() {
            for (a, b) in face.edges() {
                map.entry(undirected(a, b)).or_default().push(fi);
            }
        }
        map
    }

    /// `true` if every edge is shared by exactly two faces with opposite
    /// directions. An empty mesh is not closed.
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &self.faces {
            for e in face.edges() {
                *directed.entry(e).or_default() += 1;
            }
        }
        directed
            .iter()
            .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1))
    }

    /// Triangulate every face (ear clipping in the face plane).
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for face in &self.faces {
            if face.len() == 3 {
                out.push([face.vertices[0], face.vertices[1], face.vertices[2]]);
                continue;
            }
            let frame = self.face_frame(face);
            let poly = Polygon::new(
                face.vertices
                    .iter()
                    .map(|&v| frame.project(&self.positions[v]))
                    .collect(),
            );
            for [a, b, c] in poly.triangulate() {
                out.push([face.vertices[a], face.vertices[b], face.vertices[c]]);
            }
        }
        out
    }

    /// A copy with every position transformed. Mirroring transforms reverse
    /// the face loops so normals keep pointing outward.
    pub fn transformed(&self, t: &Transform) -> Self {
        let positions = self.positions.iter().map(|p| t.apply_point(p)).collect();
        let loops = self
            .faces
            .iter()
            .map(|f| {
                let mut verts = f.vertices.clone();
                let mut uvs = f.uvs.clone();
                if t.is_mirroring() {
                    verts.reverse();
                    if let Some(u) = uvs.as_mut() {
                        u.reverse();
                    }
                }
                (verts, uvs)
            })
            .collect();
        Self::rebuild(positions, loops)
    }

    /// A copy with every face loop reversed (normals flipped).
    pub fn flipped(&self) -> Self {
        let loops = self
            .faces
            .iter()
            .map(|f| {
                let mut verts = f.vertices.clone();
                let mut uvs = f.uvs.clone();
                verts.reverse();
                if let Some(u) = uvs.as_mut() {
                    u.reverse();
                }
                (verts, uvs)
            })
            .collect();
        Self::rebuild(self.positions.clone(), loops)
    }

    /// Replace the UVs of one face.
    pub fn set_face_uvs(&mut self, face: usize, uvs: Vec<Point2>) -> Result<()> {
        let face_count = self.faces.len();
        let f = self
            .faces
            .get_mut(face)
            .ok_or(MeshError::FaceOutOfRange { face, face_count })?;
        if f.vertices.len() != uvs.len() {
            return Err(MeshError::UvLengthMismatch {
                face,
                corners: f.vertices.len(),
                uvs: uvs.len(),
            });
        }
        f.uvs = Some(uvs);
        Ok(())
    }

    /// Drop vertices no face references and renumber the rest.
    pub fn compacted(&self) -> Self {
        let mut remap = vec![usize::MAX; self.positions.len()];
        let mut positions = Vec::new();
        for face in &self.faces {
            for &v in &face.vertices {
                if remap[v] == usize::MAX {
                    remap[v] = positions.len();
                    positions.push(self.positions[v]);
                }
            }
        }
        let faces = self
            .faces
            .iter()
            .map(|f| Face {
                vertices: f.vertices.iter().map(|&v| remap[v]).collect(),
                normal: f.normal,
                uvs: f.uvs.clone(),
            })
            .collect();
        Self { positions, faces }
    }

    /// Face loops with their UVs, in face order.
    pub fn face_loops(&self) -> Vec<FaceLoop> {
        self.faces
            .iter()
            .map(|f| (f.vertices.clone(), f.uvs.clone()))
            .collect()
    }

    /// Rebuild after moving vertices without changing loops: keeps faces
    /// whose normal can still be computed.
    pub(crate) fn rebuild(positions: Vec<Point3>, loops: Vec<FaceLoop>) -> Self {
        let faces = loops
            .into_iter()
            .filter_map(|(vertices, uvs)| {
                loop_normal(&positions, &vertices).map(|normal| Face {
                    vertices,
                    normal,
                    uvs,
                })
            })
            .collect();
        Self { positions, faces }
    }
}

/// Sorted vertex pair.
pub fn undirected(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Newell's method: twice the area times the unit normal.
fn newell(positions: &[Point3], vertices: &[usize]) -> Vec3 {
    let n = vertices.len();
    let mut acc = Vec3::zeros();
    for i in 0..n {
        let a = positions[vertices[i]];
        let b = positions[vertices[(i + 1) % n]];
        acc.x += (a.y - b.y) * (a.z + b.z);
        acc.y += (a.z - b.z) * (a.x + b.x);
        acc.z += (a.x - b.x) * (a.y + b.y);
    }
    acc
}

fn loop_normal(positions: &[Point3], vertices: &[usize]) -> Option<Dir3> {
    if vertices.len() < 3 {
        return None;
    }
    let mut distinct = vertices.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 3 {
        return None;
    }
    let n = newell(positions, vertices);
    let scale = vertices
        .iter()
        .map(|&v| (positions[v] - positions[vertices[0]]).norm_squared())
        .fold(0.0, f64::max);
    if scale == 0.0 || n.norm() <= 1e-12 * scale {
        return None;
    }
    Some(Dir3::new_normalize(n))
}

fn remove_repeated_corners(vertices: &mut Vec<usize>, mut uvs: Option<&mut Vec<Point2>>) {
    let mut i = 0;
    while vertices.len() > 1 && i < vertices.len() {
        let next = (i + 1) % vertices.len();
        if vertices[i] == vertices[next] {
            vertices.remove(next);
            if let Some(u) = uvs.as_deref_mut() {
                if next < u.len() {
                    u.remove(next);
                }
            }
            if next < i {
                i -= 1;
            }
        } else {
            i += 1;
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawFace {
    vertices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uvs: Option<Vec<Point2>>,
}

#[derive(Serialize, Deserialize)]
struct RawMesh {
    positions: Vec<Point3>,
    faces: Vec<RawFace>,
}

impl TryFrom<RawMesh> for Mesh {
    type Error = MeshError;

    fn try_from(raw: RawMesh) -> Result<Self> {
        Mesh::with_uvs(
            raw.positions,
            raw.faces.into_iter().map(|f| (f.vertices, f.uvs)).collect(),
        )
    }
}

impl From<Mesh> for RawMesh {
    fn from(mesh: Mesh) -> Self {
        RawMesh {
            positions: mesh.positions,
            faces: mesh
                .faces
                .into_iter()
                .map(|f| RawFace {
                    vertices: f.vertices,
                    uvs: f.uvs,
                })
                .collect(),
        }
    }
}
