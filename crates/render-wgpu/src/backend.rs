use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use framekit_mesh::{VertexAttribute, VertexLayout};
use framekit_render::{
    Backend, BackendError, BufferKind, FilterMode, Image, RenderSettings, SamplerState, Uniforms,
    WrapMode,
};

use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::shaders;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const INITIAL_BUFFER_BYTES: u64 = 4096;
const INITIAL_UNIFORM_SLOTS: u64 = 64;

/// Per-draw block behind the dynamic offset, mirrors `DrawUniforms` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DrawUniforms {
    projection: [f32; 16],
    model: [f32; 16],
}

/// A texture handle. The id is stable; the storage behind it is replaced
/// when an upload changes the size.
pub struct WgpuTexture {
    id: u64,
    texture: wgpu::Texture,
    sampler: SamplerState,
    bind_group: wgpu::BindGroup,
}

impl WgpuTexture {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// A vertex or index buffer handle. Storage grows by doubling.
pub struct WgpuBuffer {
    id: u64,
    kind: BufferKind,
    buffer: wgpu::Buffer,
    len: u64,
}

impl WgpuBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn capacity(&self) -> u64 {
        self.buffer.size()
    }

    /// Bytes written by the last upload.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Vertex input state. wgpu bakes the layout into the pipeline, so this only
/// records which layout was validated for the mesh.
pub struct WgpuVertexArray {
    id: u64,
    layout: Option<VertexLayout>,
}

impl WgpuVertexArray {
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct UniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    slots: u64,
    cursor: u64,
}

impl UniformRing {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, slots: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniforms"),
            size: stride * slots,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniforms_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            slots,
            cursor: 0,
        }
    }
}

// Field order is drop order: the pass must go before its encoder.
struct Frame {
    pass: wgpu::RenderPass<'static>,
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    mesh_bound: bool,
}

/// [`Backend`] on wgpu with a single fixed textured-mesh pipeline.
///
/// A frame is one render pass on the current swapchain image: `begin_frame`
/// clears color and depth, each draw binds its texture, buffers and a slot of
/// the dynamic uniform buffer, and `end_frame` submits and presents.
pub struct WgpuBackend {
    gpu: GpuContext,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_stride: u64,
    uniforms: UniformRing,
    samplers: HashMap<SamplerState, wgpu::Sampler>,
    last_id: u64,
    frame: Option<Frame>,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Result<Self, BackendError> {
        let device = gpu.device();
        let uniform_stride = align_up(
            size_of::<DrawUniforms>() as u64,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        let (pipeline, uniform_layout, texture_layout) = scoped(device, BackendError::Context, || {
            create_pipeline(device, gpu.surface_format())
        })??;
        let uniforms = UniformRing::new(device, &uniform_layout, uniform_stride, INITIAL_UNIFORM_SLOTS);

        tracing::debug!(uniform_stride, "textured-mesh pipeline ready");
        Ok(Self {
            gpu,
            pipeline,
            uniform_layout,
            texture_layout,
            uniform_stride,
            uniforms,
            samplers: HashMap::new(),
            last_id: 0,
            frame: None,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Follow a window resize. Takes effect from the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

impl Backend for WgpuBackend {
    type Texture = WgpuTexture;
    type Buffer = WgpuBuffer;
    type VertexArray = WgpuVertexArray;

    fn create_texture(&mut self) -> Result<WgpuTexture, BackendError> {
        let id = self.next_id();
        let sampler = SamplerState::CLAMP_NEAREST;
        let device = self.gpu.device();
        let (texture, bind_group) = scoped(device, BackendError::Allocation, || {
            // 1x1 placeholder until the first upload sets the real size.
            let texture = allocate_texture(device, 1, 1);
            let bind_group = texture_bind_group(
                device,
                &self.texture_layout,
                &texture,
                cached_sampler(&mut self.samplers, device, sampler),
            );
            (texture, bind_group)
        })?;
        tracing::trace!(id, "texture created");
        Ok(WgpuTexture {
            id,
            texture,
            sampler,
            bind_group,
        })
    }

    fn upload_texture(&mut self, texture: &mut WgpuTexture, image: &Image) -> Result<(), BackendError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(BackendError::Upload(format!("texture {} upload is empty", texture.id)));
        }

        // A resize is staged and only committed once the pixels are written.
        let device = self.gpu.device();
        let staged = if texture.size() != (width, height) {
            Some(scoped(device, BackendError::Allocation, || {
                let storage = allocate_texture(device, width, height);
                let bind_group = texture_bind_group(
                    device,
                    &self.texture_layout,
                    &storage,
                    cached_sampler(&mut self.samplers, device, texture.sampler),
                );
                (storage, bind_group)
            })?)
        } else {
            None
        };
        let target = staged.as_ref().map_or(&texture.texture, |(storage, _)| storage);

        let queue = self.gpu.queue();
        scoped(device, BackendError::Upload, || {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: target,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(image.bytes_per_row()),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        })?;

        if let Some((storage, bind_group)) = staged {
            texture.texture = storage;
            texture.bind_group = bind_group;
            tracing::trace!(id = texture.id, width, height, "texture storage reallocated");
        }
        Ok(())
    }

    fn set_sampler(&mut self, texture: &mut WgpuTexture, sampler: SamplerState) -> Result<(), BackendError> {
        if texture.sampler == sampler {
            return Ok(());
        }
        let device = self.gpu.device();
        let bind_group = scoped(device, BackendError::Allocation, || {
            texture_bind_group(
                device,
                &self.texture_layout,
                &texture.texture,
                cached_sampler(&mut self.samplers, device, sampler),
            )
        })?;
        texture.sampler = sampler;
        texture.bind_group = bind_group;
        Ok(())
    }

    fn delete_texture(&mut self, texture: WgpuTexture) {
        // Storage is freed once no submitted frame references it.
        tracing::trace!(id = texture.id, "texture deleted");
    }

    fn create_vertex_array(&mut self) -> Result<WgpuVertexArray, BackendError> {
        Ok(WgpuVertexArray {
            id: self.next_id(),
            layout: None,
        })
    }

    fn create_buffer(&mut self, kind: BufferKind) -> Result<WgpuBuffer, BackendError> {
        let id = self.next_id();
        let device = self.gpu.device();
        let buffer = scoped(device, BackendError::Allocation, || {
            allocate_buffer(device, kind, INITIAL_BUFFER_BYTES)
        })?;
        Ok(WgpuBuffer {
            id,
            kind,
            buffer,
            len: 0,
        })
    }

    fn bind_layout(
        &mut self,
        vertex_array: &mut WgpuVertexArray,
        vertex_buffer: &WgpuBuffer,
        index_buffer: &WgpuBuffer,
        layout: &VertexLayout,
    ) -> Result<(), BackendError> {
        if vertex_buffer.kind != BufferKind::Vertex || index_buffer.kind != BufferKind::Index {
            return Err(BackendError::Allocation(format!(
                "vertex array {} bound to mismatched buffers {} and {}",
                vertex_array.id, vertex_buffer.id, index_buffer.id
            )));
        }
        if *layout != VertexLayout::STANDARD {
            return Err(BackendError::Allocation(format!(
                "vertex array {}: layout {layout:?} is not supported by the textured-mesh pipeline",
                vertex_array.id
            )));
        }
        vertex_array.layout = Some(*layout);
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: &mut WgpuBuffer, data: &[u8]) -> Result<(), BackendError> {
        let needed = data.len() as u64;
        if needed % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(BackendError::Upload(format!(
                "buffer {} upload of {needed} bytes is not {}-byte aligned",
                buffer.id,
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        let device = self.gpu.device();
        let grown = if needed > buffer.capacity() {
            let capacity = grown_capacity(buffer.capacity(), needed);
            let kind = buffer.kind;
            Some(scoped(device, BackendError::Allocation, || {
                allocate_buffer(device, kind, capacity)
            })?)
        } else {
            None
        };
        let target = grown.as_ref().unwrap_or(&buffer.buffer);

        if !data.is_empty() {
            let queue = self.gpu.queue();
            scoped(device, BackendError::Upload, || {
                queue.write_buffer(target, 0, data);
            })?;
        }
        if let Some(storage) = grown {
            buffer.buffer = storage;
            tracing::trace!(id = buffer.id, capacity = buffer.capacity(), "buffer storage grown");
        }
        buffer.len = needed;
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: WgpuVertexArray) {
        tracing::trace!(id = vertex_array.id, "vertex array deleted");
    }

    fn delete_buffer(&mut self, buffer: WgpuBuffer) {
        tracing::trace!(id = buffer.id, "buffer deleted");
    }

    fn begin_frame(&mut self, settings: &RenderSettings) -> Result<(), BackendError> {
        if self.frame.take().is_some() {
            tracing::warn!("previous frame was never finished; discarding it");
        }

        let surface_texture = self.gpu.acquire()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let [r, g, b, a] = settings.clear_color;
        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(settings.clear_depth as f32),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();

        self.uniforms.cursor = 0;
        self.frame = Some(Frame {
            pass,
            encoder,
            surface_texture,
            mesh_bound: false,
        });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &WgpuTexture) -> Result<(), BackendError> {
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        if unit != 0 {
            return Err(BackendError::Context(format!("texture unit {unit} is not available")));
        }
        frame.pass.set_bind_group(1, &texture.bind_group, &[]);
        Ok(())
    }

    fn bind_mesh(
        &mut self,
        vertex_array: &WgpuVertexArray,
        vertex_buffer: &WgpuBuffer,
        index_buffer: &WgpuBuffer,
    ) -> Result<(), BackendError> {
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        if vertex_array.layout.is_none() {
            return Err(BackendError::Context(format!(
                "vertex array {} has no layout bound",
                vertex_array.id
            )));
        }
        frame.pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));
        frame
            .pass
            .set_index_buffer(index_buffer.buffer.slice(..), wgpu::IndexFormat::Uint32);
        frame.mesh_bound = true;
        Ok(())
    }

    fn use_program(&mut self) -> Result<(), BackendError> {
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        frame.pass.set_pipeline(&self.pipeline);
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &Uniforms) -> Result<(), BackendError> {
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        if uniforms.sampler != 0 {
            return Err(BackendError::Context(format!(
                "sampler unit {} is not available",
                uniforms.sampler
            )));
        }

        if self.uniforms.cursor == self.uniforms.slots {
            // Draws already recorded keep the old buffer alive through their bind group.
            let slots = self.uniforms.slots * 2;
            self.uniforms = UniformRing::new(self.gpu.device(), &self.uniform_layout, self.uniform_stride, slots);
            tracing::debug!(slots, "uniform buffer grown");
        }

        let offset = self.uniforms.cursor * self.uniform_stride;
        let block = DrawUniforms {
            projection: uniforms.projection,
            model: uniforms.model,
        };
        self.gpu
            .queue()
            .write_buffer(&self.uniforms.buffer, offset, bytemuck::bytes_of(&block));
        frame
            .pass
            .set_bind_group(0, &self.uniforms.bind_group, &[offset as u32]);
        self.uniforms.cursor += 1;
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), BackendError> {
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        if index_count == 0 {
            return Ok(());
        }
        if !frame.mesh_bound {
            return Err(BackendError::Context("indexed draw without a bound mesh".into()));
        }
        frame.pass.draw_indexed(0..index_count, 0, 0..1);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let Frame {
            pass,
            encoder,
            surface_texture,
            ..
        } = self.frame.take().ok_or(BackendError::NoActiveFrame)?;
        drop(pass);

        let queue = self.gpu.queue();
        scoped(self.gpu.device(), BackendError::Context, || {
            queue.submit(std::iter::once(encoder.finish()));
        })?;
        surface_texture.present();
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.frame.take().is_some() {
            tracing::debug!("frame aborted");
        }
    }
}

/// Run `f` inside out-of-memory and validation error scopes and turn a
/// captured error into `fail(message)`.
fn scoped<T>(
    device: &wgpu::Device,
    fail: fn(String) -> BackendError,
    f: impl FnOnce() -> T,
) -> Result<T, BackendError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match out_of_memory.or(validation) {
        Some(error) => Err(fail(error.to_string())),
        None => Ok(value),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
) -> Result<(wgpu::RenderPipeline, wgpu::BindGroupLayout, wgpu::BindGroupLayout), BackendError> {
    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("draw_uniforms_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(size_of::<DrawUniforms>() as u64),
            },
            count: None,
        }],
    });

    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("textured_mesh_pipeline_layout"),
        bind_group_layouts: &[&uniform_layout, &texture_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("textured_mesh_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::TEXTURED_MESH_SHADER.into()),
    });

    let layout = VertexLayout::STANDARD;
    let attributes = vertex_attributes(&layout)?;

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("textured_mesh_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: layout.stride_bytes(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });

    Ok((pipeline, uniform_layout, texture_layout))
}

fn vertex_format(attribute: &VertexAttribute) -> Result<wgpu::VertexFormat, BackendError> {
    match attribute.components {
        1 => Ok(wgpu::VertexFormat::Float32),
        2 => Ok(wgpu::VertexFormat::Float32x2),
        3 => Ok(wgpu::VertexFormat::Float32x3),
        4 => Ok(wgpu::VertexFormat::Float32x4),
        n => Err(BackendError::Context(format!(
            "attribute at location {} has {n} components",
            attribute.location
        ))),
    }
}

fn vertex_attributes(layout: &VertexLayout) -> Result<[wgpu::VertexAttribute; 2], BackendError> {
    let convert = |attribute: &VertexAttribute| -> Result<wgpu::VertexAttribute, BackendError> {
        Ok(wgpu::VertexAttribute {
            format: vertex_format(attribute)?,
            offset: attribute.byte_offset(),
            shader_location: attribute.location,
        })
    };
    Ok([convert(&layout.position)?, convert(&layout.texcoord)?])
}

fn allocate_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("registry_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn allocate_buffer(device: &wgpu::Device, kind: BufferKind, size: u64) -> wgpu::Buffer {
    let (label, usage) = match kind {
        BufferKind::Vertex => ("vertex_buffer", wgpu::BufferUsages::VERTEX),
        BufferKind::Index => ("index_buffer", wgpu::BufferUsages::INDEX),
    };
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn cached_sampler<'a>(
    samplers: &'a mut HashMap<SamplerState, wgpu::Sampler>,
    device: &wgpu::Device,
    state: SamplerState,
) -> &'a wgpu::Sampler {
    samplers
        .entry(state)
        .or_insert_with(|| device.create_sampler(&sampler_descriptor(state)))
}

fn sampler_descriptor(state: SamplerState) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("texture_sampler"),
        address_mode_u: address_mode(state.wrap_u),
        address_mode_v: address_mode(state.wrap_v),
        mag_filter: filter_mode(state.mag_filter),
        min_filter: filter_mode(state.min_filter),
        ..Default::default()
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Double `current` until it holds `needed` bytes.
fn grown_capacity(current: u64, needed: u64) -> u64 {
    let mut capacity = current.max(wgpu::COPY_BUFFER_ALIGNMENT);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}
