//! Geometry buffer: one mesh in CPU memory before upload.
//!
//! Vertices are stored interleaved as `x y z u v` (stride 5, position at 0,
//! texcoord at 3). Triangles are stored as three `u32` indices each.
//!
//! # Invariants
//! - Backing stores only grow, and only by doubling.
//! - Only the first `n_vertices * 5` / `n_triangles * 3` slots are meaningful.
//! - Indices are not checked against `n_vertices`; the caller keeps them in range.

mod buffer;
mod layout;
pub mod primitives;

pub use buffer::{Mesh, Vertex};
pub use layout::{VertexAttribute, VertexLayout};

pub fn crate_info() -> &'static str {
    "framekit-mesh v0.1.0"
}
