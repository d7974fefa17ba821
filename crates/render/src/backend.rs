use framekit_mesh::VertexLayout;
use serde::Serialize;

use crate::{BackendError, Image};

/// Per-frame clear values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// RGBA clear color. Opaque black by default.
    pub clear_color: [f64; 4],
    /// Depth clear value. The far plane (1.0) by default.
    pub clear_depth: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampling parameters attached to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SamplerState {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

impl SamplerState {
    /// Clamp on both axes, nearest-neighbour in both directions.
    pub const CLAMP_NEAREST: Self = Self {
        wrap_u: WrapMode::ClampToEdge,
        wrap_v: WrapMode::ClampToEdge,
        min_filter: FilterMode::Nearest,
        mag_filter: FilterMode::Nearest,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Shader inputs for one draw: matrices in upload form plus the sampler unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Uniforms {
    pub projection: [f32; 16],
    pub model: [f32; 16],
    pub sampler: u32,
}

/// The GPU seam. The registry and frame submitter only talk to the device
/// through this trait, so the same core drives wgpu or a recording stand-in.
///
/// Native handle types are owned by whoever holds them; the `delete_*` methods
/// consume them.
pub trait Backend {
    type Texture;
    type Buffer;
    type VertexArray;

    fn create_texture(&mut self) -> Result<Self::Texture, BackendError>;
    /// Replace the texture's contents (and size) with `image`.
    fn upload_texture(
        &mut self,
        texture: &mut Self::Texture,
        image: &Image,
    ) -> Result<(), BackendError>;
    fn set_sampler(
        &mut self,
        texture: &mut Self::Texture,
        sampler: SamplerState,
    ) -> Result<(), BackendError>;
    fn delete_texture(&mut self, texture: Self::Texture);

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, BackendError>;
    fn create_buffer(&mut self, kind: BufferKind) -> Result<Self::Buffer, BackendError>;
    /// Record `layout` and the buffer pair on a freshly created vertex array.
    fn bind_layout(
        &mut self,
        vertex_array: &mut Self::VertexArray,
        vertex_buffer: &Self::Buffer,
        index_buffer: &Self::Buffer,
        layout: &VertexLayout,
    ) -> Result<(), BackendError>;
    fn upload_buffer(&mut self, buffer: &mut Self::Buffer, data: &[u8]) -> Result<(), BackendError>;
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// Start a frame: clear color and depth, enable depth testing and back-face culling.
    fn begin_frame(&mut self, settings: &RenderSettings) -> Result<(), BackendError>;
    fn bind_texture(&mut self, unit: u32, texture: &Self::Texture) -> Result<(), BackendError>;
    fn bind_mesh(
        &mut self,
        vertex_array: &Self::VertexArray,
        vertex_buffer: &Self::Buffer,
        index_buffer: &Self::Buffer,
    ) -> Result<(), BackendError>;
    /// Activate the fixed textured-mesh program.
    fn use_program(&mut self) -> Result<(), BackendError>;
    fn set_uniforms(&mut self, uniforms: &Uniforms) -> Result<(), BackendError>;
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), BackendError>;
    /// Finish the frame and hand it to the display.
    fn end_frame(&mut self) -> Result<(), BackendError>;
    /// Throw away a half-built frame after an error.
    fn abort_frame(&mut self);
}
