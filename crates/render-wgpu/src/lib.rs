//! wgpu backend for the framekit renderer.
//!
//! [`WgpuBackend`] implements [`framekit_render::Backend`] with one fixed
//! pipeline: interleaved position/texcoord vertices, a sampled RGBA8 texture,
//! and per-draw projection and model matrices.
//!
//! # Invariants
//! - Handle ids never change; storage behind a handle may be reallocated on upload.
//! - Matrices use OpenGL clip depth and are remapped to wgpu's range in the shader.
//! - Depth testing (less) and back-face culling (counter-clockwise front) are always on.

mod backend;
mod gpu;
mod shaders;

pub use backend::{WgpuBackend, WgpuBuffer, WgpuTexture, WgpuVertexArray};
pub use gpu::{DEPTH_FORMAT, GpuContext, GpuInit};

use framekit_render::{RenderError, RenderSettings, Renderer};

/// Set up the GPU for `target` and wrap it in a [`Renderer`].
///
/// Any failure to obtain a usable device is reported as
/// [`RenderError::ContextUnavailable`].
pub fn create_renderer(
    target: impl Into<wgpu::SurfaceTarget<'static>>,
    width: u32,
    height: u32,
    init: &GpuInit,
    settings: RenderSettings,
) -> Result<Renderer<WgpuBackend>, RenderError> {
    let unavailable = |e: framekit_render::BackendError| RenderError::ContextUnavailable(e.to_string());
    let gpu = GpuContext::new(target, width, height, init).map_err(unavailable)?;
    let backend = WgpuBackend::new(gpu).map_err(unavailable)?;
    Ok(Renderer::with_settings(backend, settings))
}

pub fn crate_info() -> &'static str {
    "framekit-render-wgpu v0.1.0"
}
