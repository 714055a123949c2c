//! Error types for mesh construction and editing.

use thiserror::Error;

/// Errors that can occur while building or editing a [`Mesh`](crate::Mesh).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A face loop references a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidIndex {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A face has fewer than three distinct corners or zero area.
    #[error("face {0} is degenerate")]
    DegenerateFace(usize),

    /// A face id passed to an edit operation is out of range.
    #[error("face {face} out of range, mesh has {face_count} faces")]
    FaceOutOfRange {
        /// Requested face.
        face: usize,
        /// Number of faces in the mesh.
        face_count: usize,
    },

    /// The per-corner UV list does not match the face loop length.
    #[error("face {face} has {corners} corners but {uvs} UVs were given")]
    UvLengthMismatch {
        /// Face receiving the UVs.
        face: usize,
        /// Corners in the face loop.
        corners: usize,
        /// UVs supplied.
        uvs: usize,
    },

    /// A face region does not have a single simple boundary loop.
    #[error("face region cannot be merged: {0}")]
    NonSimpleRegion(String),

    /// A vertex position is NaN or infinite.
    #[error("vertex {0} has a non-finite coordinate")]
    NonFinitePosition(usize),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
