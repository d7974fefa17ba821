use std::collections::HashMap;

use framekit_mesh::{Mesh, VertexLayout};

use crate::{Backend, BackendError, BufferKind, Image, RenderError, ResourceKind, SamplerState};

/// A texture living on the backend.
pub struct TextureResource<B: Backend> {
    native: B::Texture,
    width: u32,
    height: u32,
}

impl<B: Backend> TextureResource<B> {
    pub fn native(&self) -> &B::Texture {
        &self.native
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A mesh living on the backend: vertex array state, its two buffers, and the
/// counts of the last upload.
pub struct MeshResource<B: Backend> {
    vertex_array: B::VertexArray,
    vertex_buffer: B::Buffer,
    index_buffer: B::Buffer,
    n_vertices: usize,
    n_triangles: usize,
    index_count: u32,
}

impl<B: Backend> MeshResource<B> {
    pub fn vertex_array(&self) -> &B::VertexArray {
        &self.vertex_array
    }

    pub fn vertex_buffer(&self) -> &B::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &B::Buffer {
        &self.index_buffer
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_triangles(&self) -> usize {
        self.n_triangles
    }

    /// Number of indices an indexed draw of this mesh consumes.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// String-keyed textures and meshes with create-once, update-in-place semantics.
///
/// The first `set_*` under an id allocates native handles; later calls reuse
/// them and only replace content. A failed call never leaves a half-built
/// resource reachable under its id: a failed creation registers nothing and a
/// failed update releases the resource. Entries are otherwise never evicted.
pub struct Registry<B: Backend> {
    textures: HashMap<String, TextureResource<B>>,
    meshes: HashMap<String, MeshResource<B>>,
}

impl<B: Backend> Default for Registry<B> {
    fn default() -> Self {
        Self {
            textures: HashMap::new(),
            meshes: HashMap::new(),
        }
    }
}

impl<B: Backend> Registry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, id: &str) -> Option<&TextureResource<B>> {
        self.textures.get(id)
    }

    pub fn mesh(&self, id: &str) -> Option<&MeshResource<B>> {
        self.meshes.get(id)
    }

    pub fn contains_texture(&self, id: &str) -> bool {
        self.textures.contains_key(id)
    }

    pub fn contains_mesh(&self, id: &str) -> bool {
        self.meshes.contains_key(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Create or update the texture under `id` with `image`.
    ///
    /// Sampler parameters (clamp to edge, nearest) are applied on every call.
    /// If an update fails part-way, the texture is released and `id` is no
    /// longer registered.
    pub fn set_texture(&mut self, backend: &mut B, id: &str, image: &Image) -> Result<(), RenderError> {
        let failed = |source| RenderError::ResourceAllocation {
            kind: ResourceKind::Texture,
            id: id.to_owned(),
            source,
        };

        let (mut native, created) = match self.textures.remove(id) {
            Some(existing) => (existing.native, false),
            None => (backend.create_texture().map_err(failed)?, true),
        };
        if let Err(e) = fill_texture(backend, &mut native, image) {
            backend.delete_texture(native);
            tracing::debug!(id, created, "texture released after failed upload");
            return Err(failed(e));
        }
        self.textures.insert(
            id.to_owned(),
            TextureResource {
                native,
                width: image.width(),
                height: image.height(),
            },
        );
        tracing::debug!(id, created, width = image.width(), height = image.height(), "texture set");
        Ok(())
    }

    /// Create or update the mesh under `id`, uploading only the valid prefix of
    /// its vertex and index stores.
    ///
    /// A mesh too large to index with `u32` is rejected before anything is
    /// touched. If an upload fails part-way, the mesh is released and `id` is
    /// no longer registered.
    pub fn set_mesh(&mut self, backend: &mut B, id: &str, mesh: &Mesh) -> Result<(), RenderError> {
        let failed = |source| RenderError::ResourceAllocation {
            kind: ResourceKind::Mesh,
            id: id.to_owned(),
            source,
        };

        let index_count = index_count(mesh.n_triangles()).map_err(failed)?;
        let (mut resource, created) = match self.meshes.remove(id) {
            Some(existing) => (existing, false),
            None => (allocate_mesh(backend, mesh.layout()).map_err(failed)?, true),
        };
        if let Err(e) = upload_geometry(backend, &mut resource, mesh, index_count) {
            release_mesh(backend, resource);
            tracing::debug!(id, created, "mesh released after failed upload");
            return Err(failed(e));
        }
        self.meshes.insert(id.to_owned(), resource);
        tracing::debug!(
            id,
            created,
            vertices = mesh.n_vertices(),
            triangles = mesh.n_triangles(),
            "mesh set"
        );
        Ok(())
    }

    /// Release every native handle and empty the registry.
    pub fn release_all(&mut self, backend: &mut B) {
        let (textures, meshes) = (self.textures.len(), self.meshes.len());
        for (_, texture) in self.textures.drain() {
            backend.delete_texture(texture.native);
        }
        for (_, mesh) in self.meshes.drain() {
            release_mesh(backend, mesh);
        }
        tracing::debug!(textures, meshes, "registry released");
    }
}

fn fill_texture<B: Backend>(backend: &mut B, native: &mut B::Texture, image: &Image) -> Result<(), BackendError> {
    backend.upload_texture(native, image)?;
    backend.set_sampler(native, SamplerState::CLAMP_NEAREST)
}

/// Allocate vertex array state and both buffers, then fix the layout. Anything
/// allocated before a failing step is released again.
fn allocate_mesh<B: Backend>(backend: &mut B, layout: &VertexLayout) -> Result<MeshResource<B>, BackendError> {
    let mut vertex_array = backend.create_vertex_array()?;

    let vertex_buffer = match backend.create_buffer(BufferKind::Vertex) {
        Ok(buffer) => buffer,
        Err(e) => {
            backend.delete_vertex_array(vertex_array);
            return Err(e);
        }
    };

    let index_buffer = match backend.create_buffer(BufferKind::Index) {
        Ok(buffer) => buffer,
        Err(e) => {
            backend.delete_buffer(vertex_buffer);
            backend.delete_vertex_array(vertex_array);
            return Err(e);
        }
    };

    if let Err(e) = backend.bind_layout(&mut vertex_array, &vertex_buffer, &index_buffer, layout) {
        backend.delete_buffer(index_buffer);
        backend.delete_buffer(vertex_buffer);
        backend.delete_vertex_array(vertex_array);
        return Err(e);
    }

    Ok(MeshResource {
        vertex_array,
        vertex_buffer,
        index_buffer,
        n_vertices: 0,
        n_triangles: 0,
        index_count: 0,
    })
}

/// Indices needed for `n_triangles`, if they fit the `u32` index range.
fn index_count(n_triangles: usize) -> Result<u32, BackendError> {
    n_triangles
        .checked_mul(3)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| BackendError::Allocation(format!("{n_triangles} triangles exceed the u32 index range")))
}

fn upload_geometry<B: Backend>(
    backend: &mut B,
    resource: &mut MeshResource<B>,
    mesh: &Mesh,
    index_count: u32,
) -> Result<(), BackendError> {
    backend.upload_buffer(&mut resource.vertex_buffer, bytemuck::cast_slice(mesh.vertices()))?;
    backend.upload_buffer(&mut resource.index_buffer, bytemuck::cast_slice(mesh.indices()))?;
    resource.n_vertices = mesh.n_vertices();
    resource.n_triangles = mesh.n_triangles();
    resource.index_count = index_count;
    Ok(())
}

fn release_mesh<B: Backend>(backend: &mut B, mesh: MeshResource<B>) {
    backend.delete_buffer(mesh.index_buffer);
    backend.delete_buffer(mesh.vertex_buffer);
    backend.delete_vertex_array(mesh.vertex_array);
}
