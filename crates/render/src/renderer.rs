use std::collections::VecDeque;

use framekit_mesh::Mesh;
use futures::channel::oneshot;

use crate::frame::FrameResult;
use crate::registry::{MeshResource, TextureResource};
use crate::{
    Backend, BackendError, DrawRequest, FrameReport, FrameTicket, Image, Registry, RenderError,
    RenderSettings, ResourceKind, Uniforms,
};

/// Texture unit every draw samples from.
const TEXTURE_UNIT: u32 = 0;

struct PendingFrame {
    requests: Vec<DrawRequest>,
    completion: oneshot::Sender<FrameResult>,
}

/// A draw request resolved against the registry.
struct ResolvedDraw<'a, B: Backend> {
    texture: &'a TextureResource<B>,
    mesh: &'a MeshResource<B>,
    uniforms: Uniforms,
}

/// Immediate-mode renderer: owns the backend and the resource registry, and
/// submits at most one frame per display refresh.
///
/// [`Renderer::draw`] only queues a batch. The host calls
/// [`Renderer::on_display_refresh`] from its refresh callback; that call takes
/// the oldest queued batch, validates it against the registry, renders it and
/// resolves its [`FrameTicket`]. Batches are never merged or cancelled.
///
/// Everything runs on the thread that owns the renderer.
pub struct Renderer<B: Backend> {
    backend: B,
    registry: Registry<B>,
    settings: RenderSettings,
    pending: VecDeque<PendingFrame>,
    frames_submitted: u64,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, RenderSettings::default())
    }

    pub fn with_settings(backend: B, settings: RenderSettings) -> Self {
        tracing::debug!(?settings, "renderer created");
        Self {
            backend,
            registry: Registry::new(),
            settings,
            pending: VecDeque::new(),
            frames_submitted: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Batches queued by `draw` and not yet taken by a refresh.
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    /// Refresh callbacks that have processed a batch so far.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn set_texture(&mut self, id: &str, image: &Image) -> Result<(), RenderError> {
        self.registry.set_texture(&mut self.backend, id, image)
    }

    pub fn set_mesh(&mut self, id: &str, mesh: &Mesh) -> Result<(), RenderError> {
        self.registry.set_mesh(&mut self.backend, id, mesh)
    }

    /// Queue `requests` for the next free display refresh.
    ///
    /// The batch is copied, so the caller may reuse its request buffers
    /// immediately. Nothing is validated until the refresh runs.
    pub fn draw(&mut self, requests: &[DrawRequest]) -> FrameTicket {
        let (completion, ticket) = FrameTicket::channel();
        self.pending.push_back(PendingFrame {
            requests: requests.to_vec(),
            completion,
        });
        tracing::trace!(requests = requests.len(), pending = self.pending.len(), "frame queued");
        ticket
    }

    /// Display-refresh callback. Renders the oldest queued batch, if any, and
    /// resolves its ticket. Returns whether a batch was processed.
    pub fn on_display_refresh(&mut self) -> bool {
        let Some(frame) = self.pending.pop_front() else {
            return false;
        };

        let frame_index = self.frames_submitted;
        self.frames_submitted += 1;

        let _span = tracing::debug_span!("frame", index = frame_index).entered();
        let result = self.submit(frame_index, &frame.requests);
        match &result {
            Ok(report) => tracing::trace!(draws = report.draw_calls, indices = report.indices, "frame submitted"),
            Err(e) => tracing::warn!("frame rejected: {e}"),
        }

        // The caller may have dropped the ticket; the frame still happened.
        let _ = frame.completion.send(result);
        true
    }

    fn submit(&mut self, frame_index: u64, requests: &[DrawRequest]) -> FrameResult {
        let draws = resolve(&self.registry, requests)?;
        match encode(&mut self.backend, &self.settings, &draws) {
            Ok(indices) => Ok(FrameReport {
                frame_index,
                draw_calls: draws.len(),
                indices,
            }),
            Err(e) => {
                self.backend.abort_frame();
                Err(RenderError::Frame(e))
            }
        }
    }
}

impl<B: Backend> Drop for Renderer<B> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(pending = self.pending.len(), "dropping unrendered frames");
        }
        self.registry.release_all(&mut self.backend);
    }
}

/// Look up every request before touching the backend, so a missing id rejects
/// the whole batch with no side effects.
fn resolve<'a, B: Backend>(
    registry: &'a Registry<B>,
    requests: &[DrawRequest],
) -> Result<Vec<ResolvedDraw<'a, B>>, RenderError> {
    requests
        .iter()
        .map(|req| {
            let texture = registry
                .texture(&req.texture_id)
                .ok_or_else(|| RenderError::MissingResource {
                    kind: ResourceKind::Texture,
                    id: req.texture_id.clone(),
                })?;
            let mesh = registry
                .mesh(&req.mesh_id)
                .ok_or_else(|| RenderError::MissingResource {
                    kind: ResourceKind::Mesh,
                    id: req.mesh_id.clone(),
                })?;
            Ok(ResolvedDraw {
                texture,
                mesh,
                uniforms: Uniforms {
                    projection: req.transform.projection.to_cols_array_f32(),
                    model: req.transform.model.to_cols_array_f32(),
                    sampler: TEXTURE_UNIT,
                },
            })
        })
        .collect()
}

/// Issue the frame in request order. Returns the total index count.
fn encode<B: Backend>(
    backend: &mut B,
    settings: &RenderSettings,
    draws: &[ResolvedDraw<'_, B>],
) -> Result<u64, BackendError> {
    backend.begin_frame(settings)?;
    let mut indices = 0u64;
    for draw in draws {
        backend.bind_texture(TEXTURE_UNIT, draw.texture.native())?;
        backend.bind_mesh(
            draw.mesh.vertex_array(),
            draw.mesh.vertex_buffer(),
            draw.mesh.index_buffer(),
        )?;
        backend.use_program()?;
        backend.set_uniforms(&draw.uniforms)?;
        backend.draw_indexed(draw.mesh.index_count())?;
        indices += u64::from(draw.mesh.index_count());
    }
    backend.end_frame()?;
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transform;
    use crate::recording::{Command, RecordingBackend};
    use futures::FutureExt;

    fn ready_renderer() -> Renderer<RecordingBackend> {
        let mut renderer = Renderer::new(RecordingBackend::new());
        renderer
            .set_texture("tex", &Image::checkerboard(2, 1, [255; 4], [0, 0, 0, 255]))
            .unwrap();
        renderer
            .set_mesh("cube", &framekit_mesh::primitives::cube(1.0))
            .unwrap();
        renderer.backend_mut().clear_commands();
        renderer
    }

    fn request() -> DrawRequest {
        DrawRequest::new("tex", "cube", Transform::default())
    }

    #[test]
    fn draw_waits_for_display_refresh() {
        let mut renderer = ready_renderer();
        let mut ticket = renderer.draw(&[request()]);

        assert!(ticket.try_result().is_none());
        assert!(renderer.backend().commands().is_empty());
        assert_eq!(renderer.pending_frames(), 1);

        assert!(renderer.on_display_refresh());
        let report = ticket.now_or_never().unwrap().unwrap();
        assert_eq!(report.draw_calls, 1);
        assert_eq!(report.indices, 36);
    }

    #[test]
    fn refresh_without_pending_frame_does_nothing() {
        let mut renderer = ready_renderer();
        assert!(!renderer.on_display_refresh());
        assert!(renderer.backend().commands().is_empty());
    }

    #[test]
    fn missing_texture_rejects_batch_without_side_effects() {
        let mut renderer = ready_renderer();
        let ticket = renderer.draw(&[request(), DrawRequest::new("missing", "cube", Transform::default())]);
        renderer.on_display_refresh();

        let err = ticket.now_or_never().unwrap().unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingResource { kind: ResourceKind::Texture, ref id } if id == "missing"
        ));
        assert!(renderer.backend().commands().is_empty());
        assert!(renderer.backend().draw_calls().is_empty());
    }

    #[test]
    fn missing_mesh_is_reported_by_kind() {
        let mut renderer = ready_renderer();
        let ticket = renderer.draw(&[DrawRequest::new("tex", "sphere", Transform::default())]);
        renderer.on_display_refresh();
        let err = ticket.now_or_never().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "missing mesh with the id \"sphere\"");
    }

    #[test]
    fn mesh_whose_update_failed_is_not_drawn() {
        let mut renderer = ready_renderer();
        let mut small = framekit_mesh::Mesh::new();
        small.vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        small.triangle(0, 0, 0);

        // Vertex upload succeeds, index upload fails.
        renderer.backend_mut().fail_upload_in(1);
        assert!(renderer.set_mesh("cube", &small).is_err());
        renderer.backend_mut().clear_commands();

        let ticket = renderer.draw(&[request()]);
        renderer.on_display_refresh();
        assert!(matches!(
            ticket.now_or_never().unwrap(),
            Err(RenderError::MissingResource { kind: ResourceKind::Mesh, ref id }) if id == "cube"
        ));
        assert!(renderer.backend().draw_calls().is_empty());
    }

    #[test]
    fn requests_are_drawn_in_order() {
        let mut renderer = ready_renderer();
        let mut small = framekit_mesh::Mesh::new();
        small.vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        small.triangle(0, 0, 0);
        renderer.set_mesh("tri", &small).unwrap();
        renderer.backend_mut().clear_commands();

        let ticket = renderer.draw(&[
            request(),
            DrawRequest::new("tex", "tri", Transform::default()),
            request(),
        ]);
        renderer.on_display_refresh();

        assert!(ticket.now_or_never().unwrap().is_ok());
        assert_eq!(renderer.backend().draw_calls(), vec![36, 3, 36]);
    }

    #[test]
    fn frame_sequence_clears_then_draws() {
        let mut renderer = ready_renderer();
        let _ticket = renderer.draw(&[request()]);
        renderer.on_display_refresh();

        let cmds = renderer.backend().commands();
        assert!(matches!(
            cmds[0],
            Command::Clear { color, depth } if color == [0.0, 0.0, 0.0, 1.0] && depth == 1.0
        ));
        assert_eq!(cmds[1], Command::EnableDepthTest);
        assert_eq!(cmds[2], Command::EnableBackFaceCulling);
        assert!(matches!(cmds[3], Command::BindTexture { unit: 0, .. }));
        assert!(matches!(cmds[4], Command::BindMesh { .. }));
        assert_eq!(cmds[5], Command::UseProgram);
        assert!(matches!(cmds[6], Command::SetUniforms { sampler: 0, .. }));
        assert_eq!(cmds[7], Command::DrawIndexed { count: 36 });
        assert_eq!(cmds[8], Command::EndFrame);
    }

    #[test]
    fn queued_frames_resolve_fifo_one_per_refresh() {
        let mut renderer = ready_renderer();
        let mut first = renderer.draw(&[request()]);
        let mut second = renderer.draw(&[request(), request()]);
        assert_eq!(renderer.pending_frames(), 2);

        renderer.on_display_refresh();
        assert_eq!(first.try_result().map(|r| r.unwrap().frame_index), Some(0));
        assert!(second.try_result().is_none());

        renderer.on_display_refresh();
        let report = second.try_result().unwrap().unwrap();
        assert_eq!((report.frame_index, report.draw_calls), (1, 2));
        assert_eq!(renderer.pending_frames(), 0);
    }

    #[test]
    fn validation_uses_registry_state_at_refresh() {
        let mut renderer = Renderer::new(RecordingBackend::new());
        let ticket = renderer.draw(&[request()]);
        renderer
            .set_texture("tex", &Image::checkerboard(1, 1, [9; 4], [9; 4]))
            .unwrap();
        renderer
            .set_mesh("cube", &framekit_mesh::primitives::cube(1.0))
            .unwrap();
        renderer.on_display_refresh();
        assert!(ticket.now_or_never().unwrap().is_ok());
    }

    #[test]
    fn backend_failure_fails_only_that_frame() {
        let mut renderer = ready_renderer();
        renderer.backend_mut().fail_next_draw();

        let failed = renderer.draw(&[request()]);
        let next = renderer.draw(&[request()]);
        renderer.on_display_refresh();
        renderer.on_display_refresh();

        assert!(matches!(
            failed.now_or_never().unwrap(),
            Err(RenderError::Frame(BackendError::Context(_)))
        ));
        assert!(renderer.backend().commands().contains(&Command::AbortFrame));
        assert!(next.now_or_never().unwrap().is_ok());
    }

    #[test]
    fn dropping_renderer_releases_resources_and_pending_tickets() {
        let mut renderer = ready_renderer();
        let ticket = renderer.draw(&[request()]);
        drop(renderer);
        assert!(matches!(pollster::block_on(ticket), Err(RenderError::FrameDropped)));
    }

    #[test]
    fn dropped_ticket_does_not_cancel_frame() {
        let mut renderer = ready_renderer();
        drop(renderer.draw(&[request()]));
        assert!(renderer.on_display_refresh());
        assert_eq!(renderer.backend().draw_calls(), vec![36]);
    }
}
