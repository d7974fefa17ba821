//! Rendering core: resource registry and frame submission.
//!
//! Textures and meshes are registered under string ids and live on a
//! [`Backend`]. Each frame is a batch of [`DrawRequest`]s queued with
//! [`Renderer::draw`] and rendered from the host's display-refresh callback.
//!
//! # Invariants
//! - A resource's native handle never changes across updates under the same id.
//! - A failed `set_texture`/`set_mesh` leaves nothing half-built under its id; a
//!   failed update unregisters the id.
//! - A batch referencing an unknown id is rejected before any backend call for that frame.
//! - Batches render one per refresh, in submission order.

mod backend;
mod error;
mod frame;
mod image;
pub mod recording;
mod registry;
mod renderer;

pub use backend::{
    Backend, BufferKind, FilterMode, RenderSettings, SamplerState, Uniforms, WrapMode,
};
pub use error::{BackendError, ImageError, RenderError, ResourceKind};
pub use frame::{DrawRequest, FrameReport, FrameTicket, Transform};
pub use image::Image;
pub use registry::{MeshResource, Registry, TextureResource};
pub use renderer::Renderer;

pub fn crate_info() -> &'static str {
    "framekit-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    use framekit_math::{Mat4, Vec3};
    use futures::FutureExt;
    use recording::{Command, RecordingBackend};

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }

    fn scene() -> Renderer<RecordingBackend> {
        let mut renderer = Renderer::new(RecordingBackend::new());
        renderer
            .set_texture("checker", &Image::checkerboard(2, 1, [255; 4], [0, 0, 0, 255]))
            .unwrap();
        renderer
            .set_mesh("cube", &framekit_mesh::primitives::cube(0.5))
            .unwrap();
        renderer
    }

    #[test]
    fn textured_cube_renders_one_indexed_draw() {
        let mut renderer = scene();
        renderer.backend_mut().clear_commands();

        let mut model = Mat4::IDENTITY;
        model.left_multiply(&Mat4::translation(Vec3::new(0.0, 0.0, -4.0)));
        let transform = Transform {
            projection: Mat4::perspective(60f64.to_radians(), 1.0, 0.1, 100.0),
            model,
        };
        let ticket = renderer.draw(&[DrawRequest::new("checker", "cube", transform)]);
        assert!(renderer.on_display_refresh());

        let report = ticket.now_or_never().unwrap().unwrap();
        assert_eq!((report.frame_index, report.draw_calls, report.indices), (0, 1, 36));
        assert_eq!(renderer.backend().draw_calls(), vec![36]);

        let uniforms = renderer.backend().commands().iter().find_map(|c| match c {
            Command::SetUniforms { projection, model, .. } => Some((*projection, *model)),
            _ => None,
        });
        let (projection, uploaded_model) = uniforms.unwrap();
        assert_eq!(projection, transform.projection.to_cols_array_f32());
        assert_eq!(uploaded_model[14], -4.0);
    }

    #[test]
    fn identity_model_cube_draws_once() {
        let mut renderer = scene();
        let cube = renderer.registry().mesh("cube").unwrap();
        assert_eq!((cube.n_vertices(), cube.n_triangles()), (24, 12));
        let checker = renderer.registry().texture("checker").unwrap();
        assert_eq!((checker.width(), checker.height()), (2, 2));
        renderer.backend_mut().clear_commands();

        let transform = Transform {
            projection: Mat4::perspective(60f64.to_radians(), 1.0, 0.1, 100.0),
            model: Mat4::IDENTITY,
        };
        let ticket = renderer.draw(&[DrawRequest::new("checker", "cube", transform)]);
        assert!(renderer.on_display_refresh());

        let report = ticket.now_or_never().unwrap().unwrap();
        assert_eq!((report.draw_calls, report.indices), (1, 36));
        assert_eq!(renderer.backend().draw_calls(), vec![36]);
        assert!(renderer.backend().commands().iter().any(|c| matches!(
            c,
            Command::SetUniforms { model, .. } if *model == Mat4::IDENTITY.to_cols_array_f32()
        )));
    }

    #[test]
    fn unknown_mesh_id_fails_frame_and_next_frame_recovers() {
        let mut renderer = scene();
        let bad = renderer.draw(&[DrawRequest::new("checker", "teapot", Transform::default())]);
        let good = renderer.draw(&[DrawRequest::new("checker", "cube", Transform::default())]);

        renderer.on_display_refresh();
        let err = bad.now_or_never().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "missing mesh with the id \"teapot\"");

        renderer.on_display_refresh();
        assert_eq!(good.now_or_never().unwrap().unwrap().frame_index, 1);
    }
}
