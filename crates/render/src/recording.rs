//! A backend that records calls instead of talking to a GPU.
//!
//! Used by the test suite and by headless tooling. Handles are plain integers;
//! faults can be injected to exercise the failure paths of the registry and
//! the frame submitter.

use std::collections::{HashMap, HashSet};

use framekit_mesh::VertexLayout;
use serde::Serialize;

use crate::{Backend, BackendError, BufferKind, Image, RenderSettings, SamplerState, Uniforms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedTexture(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedBuffer {
    pub handle: u32,
    pub kind: BufferKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedVertexArray(pub u32);

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateTexture {
        handle: u32,
    },
    UploadTexture {
        handle: u32,
        width: u32,
        height: u32,
        bytes: usize,
    },
    SetSampler {
        handle: u32,
        sampler: SamplerState,
    },
    DeleteTexture {
        handle: u32,
    },
    CreateVertexArray {
        handle: u32,
    },
    CreateBuffer {
        handle: u32,
        kind: BufferKind,
    },
    BindLayout {
        vertex_array: u32,
        vertex_buffer: u32,
        index_buffer: u32,
        stride_bytes: u64,
    },
    UploadBuffer {
        handle: u32,
        bytes: usize,
    },
    DeleteVertexArray {
        handle: u32,
    },
    DeleteBuffer {
        handle: u32,
    },
    Clear {
        color: [f64; 4],
        depth: f64,
    },
    EnableDepthTest,
    EnableBackFaceCulling,
    BindTexture {
        unit: u32,
        handle: u32,
    },
    BindMesh {
        vertex_array: u32,
    },
    UseProgram,
    SetUniforms {
        projection: [f32; 16],
        model: [f32; 16],
        sampler: u32,
    },
    DrawIndexed {
        count: u32,
    },
    EndFrame,
    AbortFrame,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    next_handle: u32,
    live: HashSet<u32>,
    texture_contents: HashMap<u32, Vec<u8>>,
    allocations: usize,
    fail_allocation_at: Option<usize>,
    uploads: usize,
    fail_upload_at: Option<usize>,
    fail_sampler: bool,
    fail_bind_layout: bool,
    fail_draw: bool,
    in_frame: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Index counts of every recorded indexed draw, in order.
    pub fn draw_calls(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawIndexed { count } => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Handles created and not yet deleted.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// Bytes of the most recent upload to `texture`.
    pub fn texture_contents(&self, texture: RecordedTexture) -> Option<&[u8]> {
        self.texture_contents.get(&texture.0).map(Vec::as_slice)
    }

    /// Make the allocation `n` steps from now fail (0 = the next one).
    pub fn fail_allocation_in(&mut self, n: usize) {
        self.fail_allocation_at = Some(self.allocations + n);
    }

    pub fn fail_next_upload(&mut self) {
        self.fail_upload_in(0);
    }

    /// Make the texture or buffer upload `n` steps from now fail.
    pub fn fail_upload_in(&mut self, n: usize) {
        self.fail_upload_at = Some(self.uploads + n);
    }

    pub fn fail_next_sampler(&mut self) {
        self.fail_sampler = true;
    }

    pub fn fail_next_bind_layout(&mut self) {
        self.fail_bind_layout = true;
    }

    pub fn fail_next_draw(&mut self) {
        self.fail_draw = true;
    }

    fn allocate(&mut self, what: &str) -> Result<u32, BackendError> {
        let index = self.allocations;
        self.allocations += 1;
        if self.fail_allocation_at == Some(index) {
            self.fail_allocation_at = None;
            return Err(BackendError::Allocation(format!("injected failure creating {what}")));
        }
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        Ok(self.next_handle)
    }

    fn release(&mut self, handle: u32) {
        if !self.live.remove(&handle) {
            tracing::warn!(handle, "released a handle that was not live");
        }
    }

    fn check_upload(&mut self) -> Result<(), BackendError> {
        let index = self.uploads;
        self.uploads += 1;
        if self.fail_upload_at == Some(index) {
            self.fail_upload_at = None;
            return Err(BackendError::Upload("injected upload failure".into()));
        }
        Ok(())
    }

    fn check_frame(&self) -> Result<(), BackendError> {
        if self.in_frame {
            Ok(())
        } else {
            Err(BackendError::NoActiveFrame)
        }
    }
}

impl Backend for RecordingBackend {
    type Texture = RecordedTexture;
    type Buffer = RecordedBuffer;
    type VertexArray = RecordedVertexArray;

    fn create_texture(&mut self) -> Result<RecordedTexture, BackendError> {
        let handle = self.allocate("texture")?;
        self.commands.push(Command::CreateTexture { handle });
        Ok(RecordedTexture(handle))
    }

    fn upload_texture(&mut self, texture: &mut RecordedTexture, image: &Image) -> Result<(), BackendError> {
        self.check_upload()?;
        self.texture_contents.insert(texture.0, image.pixels().to_vec());
        self.commands.push(Command::UploadTexture {
            handle: texture.0,
            width: image.width(),
            height: image.height(),
            bytes: image.pixels().len(),
        });
        Ok(())
    }

    fn set_sampler(&mut self, texture: &mut RecordedTexture, sampler: SamplerState) -> Result<(), BackendError> {
        if std::mem::take(&mut self.fail_sampler) {
            return Err(BackendError::Upload("injected sampler failure".into()));
        }
        self.commands.push(Command::SetSampler {
            handle: texture.0,
            sampler,
        });
        Ok(())
    }

    fn delete_texture(&mut self, texture: RecordedTexture) {
        self.release(texture.0);
        self.texture_contents.remove(&texture.0);
        self.commands.push(Command::DeleteTexture { handle: texture.0 });
    }

    fn create_vertex_array(&mut self) -> Result<RecordedVertexArray, BackendError> {
        let handle = self.allocate("vertex array")?;
        self.commands.push(Command::CreateVertexArray { handle });
        Ok(RecordedVertexArray(handle))
    }

    fn create_buffer(&mut self, kind: BufferKind) -> Result<RecordedBuffer, BackendError> {
        let handle = self.allocate("buffer")?;
        self.commands.push(Command::CreateBuffer { handle, kind });
        Ok(RecordedBuffer { handle, kind })
    }

    fn bind_layout(
        &mut self,
        vertex_array: &mut RecordedVertexArray,
        vertex_buffer: &RecordedBuffer,
        index_buffer: &RecordedBuffer,
        layout: &VertexLayout,
    ) -> Result<(), BackendError> {
        if std::mem::take(&mut self.fail_bind_layout) {
            return Err(BackendError::Allocation("injected layout failure".into()));
        }
        self.commands.push(Command::BindLayout {
            vertex_array: vertex_array.0,
            vertex_buffer: vertex_buffer.handle,
            index_buffer: index_buffer.handle,
            stride_bytes: layout.stride_bytes(),
        });
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: &mut RecordedBuffer, data: &[u8]) -> Result<(), BackendError> {
        self.check_upload()?;
        self.commands.push(Command::UploadBuffer {
            handle: buffer.handle,
            bytes: data.len(),
        });
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: RecordedVertexArray) {
        self.release(vertex_array.0);
        self.commands.push(Command::DeleteVertexArray { handle: vertex_array.0 });
    }

    fn delete_buffer(&mut self, buffer: RecordedBuffer) {
        self.release(buffer.handle);
        self.commands.push(Command::DeleteBuffer { handle: buffer.handle });
    }

    fn begin_frame(&mut self, settings: &RenderSettings) -> Result<(), BackendError> {
        self.in_frame = true;
        self.commands.push(Command::Clear {
            color: settings.clear_color,
            depth: settings.clear_depth,
        });
        self.commands.push(Command::EnableDepthTest);
        self.commands.push(Command::EnableBackFaceCulling);
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: &RecordedTexture) -> Result<(), BackendError> {
        self.check_frame()?;
        self.commands.push(Command::BindTexture {
            unit,
            handle: texture.0,
        });
        Ok(())
    }

    fn bind_mesh(
        &mut self,
        vertex_array: &RecordedVertexArray,
        _vertex_buffer: &RecordedBuffer,
        _index_buffer: &RecordedBuffer,
    ) -> Result<(), BackendError> {
        self.check_frame()?;
        self.commands.push(Command::BindMesh {
            vertex_array: vertex_array.0,
        });
        Ok(())
    }

    fn use_program(&mut self) -> Result<(), BackendError> {
        self.check_frame()?;
        self.commands.push(Command::UseProgram);
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &Uniforms) -> Result<(), BackendError> {
        self.check_frame()?;
        self.commands.push(Command::SetUniforms {
            projection: uniforms.projection,
            model: uniforms.model,
            sampler: uniforms.sampler,
        });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), BackendError> {
        self.check_frame()?;
        if std::mem::take(&mut self.fail_draw) {
            return Err(BackendError::Context("injected draw failure".into()));
        }
        self.commands.push(Command::DrawIndexed { count: index_count });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.check_frame()?;
        self.in_frame = false;
        self.commands.push(Command::EndFrame);
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.in_frame = false;
        self.commands.push(Command::AbortFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterMode, WrapMode};

    #[test]
    fn handles_are_unique_and_tracked() {
        let mut backend = RecordingBackend::new();
        let a = backend.create_texture().unwrap();
        let b = backend.create_buffer(BufferKind::Vertex).unwrap();
        assert_ne!(a.0, b.handle);
        assert_eq!(backend.live_handles(), 2);

        backend.delete_texture(a);
        assert_eq!(backend.live_handles(), 1);
    }

    #[test]
    fn injected_allocation_failure_fires_once() {
        let mut backend = RecordingBackend::new();
        backend.fail_allocation_in(1);
        assert!(backend.create_vertex_array().is_ok());
        assert!(matches!(backend.create_vertex_array(), Err(BackendError::Allocation(_))));
        assert!(backend.create_vertex_array().is_ok());
        assert_eq!(backend.live_handles(), 2);
    }

    #[test]
    fn draw_outside_frame_is_rejected() {
        let mut backend = RecordingBackend::new();
        assert_eq!(backend.draw_indexed(3), Err(BackendError::NoActiveFrame));
    }

    #[test]
    fn command_log_serializes_with_op_tag() {
        let mut backend = RecordingBackend::new();
        backend.begin_frame(&RenderSettings::default()).unwrap();
        backend.draw_indexed(6).unwrap();
        backend.end_frame().unwrap();

        let json = serde_json::to_value(backend.commands()).unwrap();
        assert_eq!(json[0]["op"], "clear");
        assert_eq!(json[3]["op"], "draw_indexed");
        assert_eq!(json[3]["count"], 6);
    }

    #[test]
    fn upload_failure_counts_texture_and_buffer_uploads() {
        let mut backend = RecordingBackend::new();
        let mut texture = backend.create_texture().unwrap();
        let mut buffer = backend.create_buffer(BufferKind::Index).unwrap();
        let image = Image::checkerboard(2, 1, [0; 4], [255; 4]);

        backend.fail_upload_in(1);
        assert!(backend.upload_texture(&mut texture, &image).is_ok());
        assert!(matches!(backend.upload_buffer(&mut buffer, &[0; 12]), Err(BackendError::Upload(_))));
        assert!(backend.upload_buffer(&mut buffer, &[0; 12]).is_ok());
    }

    #[test]
    fn sampler_parameters_are_recorded_as_given() {
        let mut backend = RecordingBackend::new();
        let mut texture = backend.create_texture().unwrap();
        let sampler = SamplerState {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::ClampToEdge,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Nearest,
        };
        backend.set_sampler(&mut texture, sampler).unwrap();

        let json = serde_json::to_value(backend.commands()).unwrap();
        assert_eq!(json[1]["op"], "set_sampler");
        assert_eq!(json[1]["sampler"]["wrap_u"], "repeat");
        assert_eq!(json[1]["sampler"]["wrap_v"], "clamp_to_edge");
        assert_eq!(json[1]["sampler"]["min_filter"], "linear");

        backend.fail_next_sampler();
        assert!(backend.set_sampler(&mut texture, sampler).is_err());
        assert_eq!(backend.commands().len(), 2);
    }
}
