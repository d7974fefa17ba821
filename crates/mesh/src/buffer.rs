use bytemuck::{Pod, Zeroable};

use crate::VertexLayout;

/// One vertex as stored in the interleaved buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
}

/// Append-only mesh builder with independently growing vertex and index stores.
///
/// Both stores start at [`Mesh::INITIAL_CAPACITY`] elements (vertices or
/// triangles) and double whenever an append would overflow them. [`Mesh::clear`]
/// zeroes the stores but keeps their size, so a mesh can be rebuilt every frame
/// without reallocating.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertex_buffer: Vec<f32>,
    index_buffer: Vec<u32>,
    n_vertices: usize,
    n_triangles: usize,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub const INITIAL_CAPACITY: usize = 256;

    pub const POSITION_COMPONENTS: usize = VertexLayout::STANDARD.position.components;
    pub const TEXCOORD_COMPONENTS: usize = VertexLayout::STANDARD.texcoord.components;
    pub const VERTEX_COMPONENTS: usize = VertexLayout::STANDARD.stride;
    pub const POSITION_OFFSET: usize = VertexLayout::STANDARD.position.offset;
    pub const TEXCOORD_OFFSET: usize = VertexLayout::STANDARD.texcoord.offset;

    pub fn new() -> Self {
        Self {
            vertex_buffer: vec![0.0; Self::INITIAL_CAPACITY * Self::VERTEX_COMPONENTS],
            index_buffer: vec![0; Self::INITIAL_CAPACITY * 3],
            n_vertices: 0,
            n_triangles: 0,
        }
    }

    pub fn layout(&self) -> &'static VertexLayout {
        &VertexLayout::STANDARD
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_triangles(&self) -> usize {
        self.n_triangles
    }

    pub fn is_empty(&self) -> bool {
        self.n_vertices == 0 && self.n_triangles == 0
    }

    /// Capacity of the vertex store, in vertices.
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_buffer.len() / Self::VERTEX_COMPONENTS
    }

    /// Capacity of the index store, in triangles.
    pub fn triangle_capacity(&self) -> usize {
        self.index_buffer.len() / 3
    }

    /// The whole vertex store, including unused trailing capacity.
    pub fn vertex_buffer(&self) -> &[f32] {
        &self.vertex_buffer
    }

    /// The whole index store, including unused trailing capacity.
    pub fn index_buffer(&self) -> &[u32] {
        &self.index_buffer
    }

    /// The valid prefix of the vertex store.
    pub fn vertices(&self) -> &[f32] {
        &self.vertex_buffer[..self.n_vertices * Self::VERTEX_COMPONENTS]
    }

    /// The valid prefix of the index store.
    pub fn indices(&self) -> &[u32] {
        &self.index_buffer[..self.n_triangles * 3]
    }

    pub fn vertex_at(&self, index: usize) -> Option<Vertex> {
        if index >= self.n_vertices {
            return None;
        }
        let start = index * Self::VERTEX_COMPONENTS;
        let v: &[Vertex] = bytemuck::cast_slice(&self.vertex_buffer[start..start + Self::VERTEX_COMPONENTS]);
        v.first().copied()
    }

    /// Append a vertex. Its index is the vertex count before the call.
    pub fn vertex(&mut self, x: f32, y: f32, z: f32, u: f32, v: f32) {
        let ptr = self.n_vertices * Self::VERTEX_COMPONENTS;
        if self.n_vertices + 1 > self.vertex_capacity() {
            let len = self.vertex_buffer.len();
            self.vertex_buffer.resize(len * 2, 0.0);
            tracing::trace!(capacity = self.vertex_capacity(), "vertex store grown");
        }
        self.vertex_buffer[ptr..ptr + Self::VERTEX_COMPONENTS].copy_from_slice(&[x, y, z, u, v]);
        self.n_vertices += 1;
    }

    /// Append a triangle referencing three vertex indices.
    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        let ptr = self.n_triangles * 3;
        if self.n_triangles + 1 > self.triangle_capacity() {
            let len = self.index_buffer.len();
            self.index_buffer.resize(len * 2, 0);
            tracing::trace!(capacity = self.triangle_capacity(), "index store grown");
        }
        self.index_buffer[ptr..ptr + 3].copy_from_slice(&[a, b, c]);
        self.n_triangles += 1;
    }

    /// Reset both counts to zero and zero the stores, keeping their capacity.
    pub fn clear(&mut self) {
        self.vertex_buffer.fill(0.0);
        self.index_buffer.fill(0);
        self.n_vertices = 0;
        self.n_triangles = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mesh_is_empty_with_initial_capacity() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_capacity(), Mesh::INITIAL_CAPACITY);
        assert_eq!(mesh.triangle_capacity(), Mesh::INITIAL_CAPACITY);
        assert!(mesh.vertices().is_empty());
        assert!(mesh.indices().is_empty());
    }

    #[test]
    fn vertices_are_interleaved_in_call_order() {
        let mut mesh = Mesh::new();
        mesh.vertex(1.0, 2.0, 3.0, 0.25, 0.75);
        mesh.vertex(-1.0, -2.0, -3.0, 1.0, 0.0);

        assert_eq!(mesh.n_vertices(), 2);
        assert_eq!(
            mesh.vertices(),
            &[1.0, 2.0, 3.0, 0.25, 0.75, -1.0, -2.0, -3.0, 1.0, 0.0]
        );
        assert_eq!(
            mesh.vertex_at(1),
            Some(Vertex {
                position: [-1.0, -2.0, -3.0],
                texcoord: [1.0, 0.0],
            })
        );
        assert_eq!(mesh.vertex_at(2), None);
    }

    #[test]
    fn vertex_store_doubles_past_capacity() {
        let mut mesh = Mesh::new();
        let n = Mesh::INITIAL_CAPACITY * 2 + 1;
        let mut capacities = vec![mesh.vertex_capacity()];
        for i in 0..n {
            let f = i as f32;
            mesh.vertex(f, f + 0.1, f + 0.2, f + 0.3, f + 0.4);
            assert!(mesh.vertex_capacity() >= mesh.n_vertices());
            if mesh.vertex_capacity() != *capacities.last().unwrap() {
                capacities.push(mesh.vertex_capacity());
            }
        }

        assert_eq!(capacities, vec![256, 512, 1024]);
        assert_eq!(mesh.n_vertices(), n);
        for i in 0..n {
            let f = i as f32;
            let s = &mesh.vertex_buffer()[i * 5..i * 5 + 5];
            assert_eq!(s, &[f, f + 0.1, f + 0.2, f + 0.3, f + 0.4]);
        }
    }

    #[test]
    fn index_store_grows_independently() {
        let mut mesh = Mesh::new();
        for i in 0..=Mesh::INITIAL_CAPACITY as u32 {
            mesh.triangle(i, i + 1, i + 2);
        }
        assert_eq!(mesh.triangle_capacity(), Mesh::INITIAL_CAPACITY * 2);
        assert_eq!(mesh.vertex_capacity(), Mesh::INITIAL_CAPACITY);
        assert_eq!(mesh.n_triangles(), Mesh::INITIAL_CAPACITY + 1);
        assert_eq!(&mesh.indices()[..6], &[0, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn clear_zeroes_and_keeps_capacity() {
        let mut mesh = Mesh::new();
        for i in 0..300 {
            mesh.vertex(1.0, 1.0, 1.0, 1.0, i as f32);
            mesh.triangle(1, 2, 3);
        }
        let vertex_len = mesh.vertex_buffer().len();
        let index_len = mesh.index_buffer().len();

        mesh.clear();

        assert_eq!(mesh.n_vertices(), 0);
        assert_eq!(mesh.n_triangles(), 0);
        assert_eq!(mesh.vertex_buffer().len(), vertex_len);
        assert_eq!(mesh.index_buffer().len(), index_len);
        assert!(mesh.vertex_buffer().iter().all(|v| *v == 0.0));
        assert!(mesh.index_buffer().iter().all(|i| *i == 0));
    }

    #[test]
    fn cleared_mesh_is_reused_without_growth() {
        let mut mesh = Mesh::new();
        mesh.vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        mesh.clear();
        mesh.vertex(5.0, 6.0, 7.0, 8.0, 9.0);
        mesh.triangle(0, 0, 0);
        assert_eq!(mesh.vertices(), &[5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(mesh.vertex_capacity(), Mesh::INITIAL_CAPACITY);
    }
}
