use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use framekit_math::Mat4;
use futures::channel::oneshot;

use crate::RenderError;

/// Object-to-world and world-to-clip transforms for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub projection: Mat4,
    pub model: Mat4,
}

/// Draw `mesh_id` textured with `texture_id` under `transform`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    pub texture_id: String,
    pub mesh_id: String,
    pub transform: Transform,
}

impl DrawRequest {
    pub fn new(texture_id: impl Into<String>, mesh_id: impl Into<String>, transform: Transform) -> Self {
        Self {
            texture_id: texture_id.into(),
            mesh_id: mesh_id.into(),
            transform,
        }
    }
}

/// Summary of a frame handed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Zero-based position of this frame among all refresh callbacks that ran one.
    pub frame_index: u64,
    pub draw_calls: usize,
    /// Total indices submitted across all draws.
    pub indices: u64,
}

pub(crate) type FrameResult = Result<FrameReport, RenderError>;

/// Completion of one `draw` call. Resolves after the display refresh that
/// rendered (or rejected) the batch.
///
/// Dropping a ticket does not cancel the frame.
#[derive(Debug)]
#[must_use = "a frame's failure is only observable through its ticket"]
pub struct FrameTicket {
    receiver: oneshot::Receiver<FrameResult>,
    taken: bool,
}

impl FrameTicket {
    pub(crate) fn channel() -> (oneshot::Sender<FrameResult>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver, taken: false })
    }

    /// The outcome if the frame's refresh has already run.
    ///
    /// The outcome is handed out once. Later calls, and calls after the ticket
    /// was awaited to completion, return `None`.
    pub fn try_result(&mut self) -> Option<FrameResult> {
        if self.taken {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(oneshot::Canceled) => Err(RenderError::FrameDropped),
        };
        self.taken = true;
        Some(result)
    }
}

impl Future for FrameTicket {
    type Output = FrameResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(oneshot::Canceled)) => Err(RenderError::FrameDropped),
            Poll::Pending => return Poll::Pending,
        };
        self.taken = true;
        Poll::Ready(result)
    }
}
