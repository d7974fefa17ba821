use anyhow::{Context, Result};
use clap::Parser;
use framekit_math::{Mat4, Vec3};
use framekit_render::{DrawRequest, FrameTicket, Image, RenderSettings, Renderer, Transform};
use framekit_render_wgpu::{GpuInit, WgpuBackend};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const TEXTURE_ID: &str = "cube-face";
const MESH_ID: &str = "cube";

const FOV_Y_DEGREES: f64 = 60.0;
const NEAR: f64 = 1.0 / 16.0;
const FAR: f64 = 16.0;
const ROTATION_AXIS: Vec3 = Vec3::new(3.0, 5.0, 7.0);
const DISTANCE: f64 = 4.0;

#[derive(Parser)]
#[command(name = "framekit-desktop", about = "Spinning textured cube on the framekit renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Image file for the cube faces (PNG, JPEG or BMP); a checkerboard otherwise
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Seconds per full turn of the cube
    #[arg(long, default_value_t = 4.0)]
    period: f64,
}

/// The spinning cube: fixed projection parameters, one rotation per `period`.
struct Scene {
    period: f64,
    aspect: f64,
}

impl Scene {
    fn transform(&self, seconds: f64) -> Transform {
        let angle = TAU * (seconds / self.period).fract();
        let mut model = Mat4::rotation(angle, ROTATION_AXIS);
        model.left_multiply(&Mat4::translation(Vec3::new(0.0, 0.0, -DISTANCE)));
        Transform {
            projection: Mat4::perspective(FOV_Y_DEGREES.to_radians(), self.aspect, NEAR, FAR),
            model,
        }
    }
}

struct App {
    width: u32,
    height: u32,
    texture: Image,
    scene: Scene,
    started: Instant,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<WgpuBackend>>,
    in_flight: Option<FrameTicket>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(cli: &Cli, texture: Image) -> Self {
        Self {
            width: cli.width,
            height: cli.height,
            texture,
            scene: Scene {
                period: cli.period,
                aspect: f64::from(cli.width) / f64::from(cli.height.max(1)),
            },
            started: Instant::now(),
            window: None,
            renderer: None,
            in_flight: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("framekit")
            .with_inner_size(PhysicalSize::new(self.width, self.height));
        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);

        let size = window.inner_size();
        let mut renderer = framekit_render_wgpu::create_renderer(
            window.clone(),
            size.width,
            size.height,
            &GpuInit::default(),
            RenderSettings::default(),
        )?;
        renderer.set_texture(TEXTURE_ID, &self.texture)?;
        renderer.set_mesh(MESH_ID, &framekit_mesh::primitives::cube(0.5))?;

        self.scene.aspect = f64::from(size.width) / f64::from(size.height.max(1));
        self.started = Instant::now();
        window.request_redraw();

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    /// One display refresh: render the queued batch, check how the previous
    /// frame went, then queue the next one.
    fn refresh(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        renderer.on_display_refresh();

        if let Some(mut ticket) = self.in_flight.take() {
            match ticket.try_result() {
                Some(result) => {
                    let report = result.context("frame failed")?;
                    tracing::trace!(frame = report.frame_index, indices = report.indices, "frame presented");
                }
                None => self.in_flight = Some(ticket),
            }
        }

        if self.in_flight.is_none() {
            let transform = self.scene.transform(self.started.elapsed().as_secs_f64());
            self.in_flight = Some(renderer.draw(&[DrawRequest::new(TEXTURE_ID, MESH_ID, transform)]));
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.backend_mut().resize(size.width, size.height);
                }
                self.scene.aspect = f64::from(size.width.max(1)) / f64::from(size.height.max(1));
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.refresh() {
                    self.fail(event_loop, e);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release GPU resources while the window still exists.
        self.in_flight = None;
        self.renderer = None;
    }
}

fn load_texture(path: &Path) -> Result<Image> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to read texture {}", path.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok(Image::new(width, height, decoded.into_raw())?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    anyhow::ensure!(cli.period > 0.0, "--period must be positive");
    let texture = match &cli.texture {
        Some(path) => load_texture(path)?,
        None => Image::checkerboard(256, 32, [255, 255, 255, 255], [32, 96, 192, 255]),
    };

    tracing::info!("framekit-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(&cli, texture);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
