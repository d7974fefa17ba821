use std::fmt;

/// Which registry a resource id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Texture,
    Mesh,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Texture => f.write_str("texture"),
            ResourceKind::Mesh => f.write_str("mesh"),
        }
    }
}

/// Failures reported by a [`Backend`](crate::Backend) implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("allocation failed: {0}")]
    Allocation(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("graphics context error: {0}")]
    Context(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("no frame in progress")]
    NoActiveFrame,
}

/// Errors surfaced to callers of the renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No graphics context could be obtained. Fatal.
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    /// Creating or uploading a resource failed. Nothing was left registered under `id`.
    #[error("failed to set {kind} \"{id}\": {source}")]
    ResourceAllocation {
        kind: ResourceKind,
        id: String,
        #[source]
        source: BackendError,
    },
    /// A draw request referenced an id that was never registered.
    #[error("missing {kind} with the id \"{id}\"")]
    MissingResource { kind: ResourceKind, id: String },
    /// The backend failed while rendering a frame. Later frames are unaffected.
    #[error("frame submission failed: {0}")]
    Frame(#[source] BackendError),
    #[error("renderer dropped before the frame reached a display refresh")]
    FrameDropped,
}

/// Invalid pixel blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("{width}x{height} RGBA image needs {expected} bytes, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_names_the_id() {
        let err = RenderError::MissingResource {
            kind: ResourceKind::Texture,
            id: "crate".into(),
        };
        assert_eq!(err.to_string(), "missing texture with the id \"crate\"");
    }

    #[test]
    fn allocation_error_keeps_source() {
        let err = RenderError::ResourceAllocation {
            kind: ResourceKind::Mesh,
            id: "box".into(),
            source: BackendError::Allocation("index buffer".into()),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("allocation failed: index buffer"));
    }
}
