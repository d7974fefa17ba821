use framekit_render::BackendError;

/// Depth attachment format used by every frame.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device and surface options chosen at startup.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub present_mode: wgpu::PresentMode,
    pub power_preference: wgpu::PowerPreference,
    pub max_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::AutoVsync,
            power_preference: wgpu::PowerPreference::HighPerformance,
            max_frame_latency: 2,
        }
    }
}

/// Surface, device and queue for one window, plus the depth buffer that
/// tracks the surface size.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
}

impl GpuContext {
    /// Create a context presenting to `target`. Every failure is reported as
    /// [`BackendError::Context`].
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        init: &GpuInit,
    ) -> Result<Self, BackendError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| BackendError::Context(format!("create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| BackendError::Context("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("framekit_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| BackendError::Context(format!("request device: {e}")))?;

        device.on_uncaptured_error(Box::new(|e: wgpu::Error| {
            tracing::error!("uncaptured GPU error: {e}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = pick_surface_format(&caps.formats)
            .ok_or_else(|| BackendError::Context("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: init.present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: init.max_frame_latency,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let info = adapter.get_info();
        tracing::info!(
            backend = info.backend.to_str(),
            adapter = %info.name,
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Reconfigure the surface and rebuild the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
        tracing::debug!(width = self.config.width, height = self.config.height, "surface resized");
    }

    /// Next swapchain image. A lost or outdated surface is reconfigured once.
    pub fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, BackendError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| BackendError::Surface(e.to_string()))
            }
            Err(e) => Err(BackendError::Surface(e.to_string())),
        }
    }
}

/// Prefer a linear format so texels reach the screen unconverted.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_init_uses_vsync() {
        let init = GpuInit::default();
        assert_eq!(init.present_mode, wgpu::PresentMode::AutoVsync);
        assert_eq!(init.max_frame_latency, 2);
    }

    #[test]
    fn linear_surface_format_is_preferred() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(pick_surface_format(&formats), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn srgb_only_surface_still_works() {
        let formats = [wgpu::TextureFormat::Rgba8UnormSrgb];
        assert_eq!(pick_surface_format(&formats), Some(wgpu::TextureFormat::Rgba8UnormSrgb));
        assert_eq!(pick_surface_format(&[]), None);
    }
}
