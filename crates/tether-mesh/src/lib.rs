#![warn(missing_docs)]

//! Polygon meshes for the tether pipeline.
//!
//! A [`Mesh`] is an owned value: positions plus faces given as vertex loops
//! with cached unit normals and optional per-corner UVs. Every edit borrows
//! its input and returns a fresh mesh, so a caller's data is never modified
//! in place.
//!
//! Besides the data model the crate provides the edits the rope pipeline
//! composes: welding, face retention, region merging, boundary and edge
//! chain extraction and triangulation, plus the primitives the tests
//! build on.

mod edit;
mod error;
mod mesh;
pub mod polygon;
pub mod primitives;

pub use edit::EdgeChain;
pub use error::{MeshError, Result};
pub use mesh::{undirected, Face, FaceLoop, Mesh};
