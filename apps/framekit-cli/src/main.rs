use clap::{Parser, Subcommand};
use framekit_math::{Mat4, Vec3};
use framekit_render::recording::{Command, RecordingBackend};
use framekit_render::{DrawRequest, Image, Renderer, Transform};
use serde::Serialize;
use std::f64::consts::TAU;
use tracing_subscriber::EnvFilter;

const TEXTURE_ID: &str = "checker";
const MESH_ID: &str = "cube";

#[derive(Parser)]
#[command(name = "framekit-cli", about = "Headless framekit tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Render the spinning cube through the recording backend
    Scene {
        /// Number of display refreshes to simulate
        #[arg(short, long, default_value = "4")]
        frames: u64,
        /// Simulated refresh rate in Hz
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Seconds per full turn of the cube
        #[arg(long, default_value = "4")]
        period: f64,
        /// Print the recorded backend calls as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct FrameLog {
    frame: u64,
    draw_calls: usize,
    indices: u64,
    commands: Vec<Command>,
}

fn scene_transform(seconds: f64, period: f64) -> Transform {
    let angle = TAU * (seconds / period).fract();
    let mut model = Mat4::rotation(angle, Vec3::new(3.0, 5.0, 7.0));
    model.left_multiply(&Mat4::translation(Vec3::new(0.0, 0.0, -4.0)));
    Transform {
        projection: Mat4::perspective(60f64.to_radians(), 1.0, 1.0 / 16.0, 16.0),
        model,
    }
}

/// Queue one batch per simulated refresh and collect what the backend saw.
fn record_scene(frames: u64, fps: f64, period: f64) -> anyhow::Result<Vec<FrameLog>> {
    let mut renderer = Renderer::new(RecordingBackend::new());
    renderer.set_texture(TEXTURE_ID, &Image::checkerboard(8, 2, [255; 4], [0, 0, 0, 255]))?;
    renderer.set_mesh(MESH_ID, &framekit_mesh::primitives::cube(0.5))?;
    renderer.backend_mut().clear_commands();

    let mut logs = Vec::new();
    for frame in 0..frames {
        let transform = scene_transform(frame as f64 / fps, period);
        let ticket = renderer.draw(&[DrawRequest::new(TEXTURE_ID, MESH_ID, transform)]);
        renderer.on_display_refresh();
        let report = pollster::block_on(ticket)?;
        logs.push(FrameLog {
            frame: report.frame_index,
            draw_calls: report.draw_calls,
            indices: report.indices,
            commands: renderer.backend_mut().take_commands(),
        });
    }
    tracing::debug!(frames, "scene recorded");
    Ok(logs)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("framekit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("math: {}", framekit_math::crate_info());
            println!("mesh: {}", framekit_mesh::crate_info());
            println!("render: {}", framekit_render::crate_info());
        }
        Commands::Scene {
            frames,
            fps,
            period,
            json,
        } => {
            anyhow::ensure!(fps > 0.0 && period > 0.0, "--fps and --period must be positive");
            let logs = record_scene(frames, fps, period)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            } else {
                for log in &logs {
                    println!(
                        "frame {}: {} draw(s), {} indices, {} backend calls",
                        log.frame,
                        log.draw_calls,
                        log.indices,
                        log.commands.len()
                    );
                }
            }
        }
    }

    Ok(())
}
