/// One vertex attribute inside the interleaved layout, measured in `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    pub components: usize,
    pub offset: usize,
}

impl VertexAttribute {
    pub const fn byte_offset(&self) -> u64 {
        (self.offset * size_of::<f32>()) as u64
    }
}

/// The fixed vertex layout shared by every mesh: position then texcoord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Components per vertex.
    pub stride: usize,
    pub position: VertexAttribute,
    pub texcoord: VertexAttribute,
}

impl VertexLayout {
    pub const STANDARD: Self = Self {
        stride: 5,
        position: VertexAttribute {
            location: 0,
            components: 3,
            offset: 0,
        },
        texcoord: VertexAttribute {
            location: 1,
            components: 2,
            offset: 3,
        },
    };

    pub const fn stride_bytes(&self) -> u64 {
        (self.stride * size_of::<f32>()) as u64
    }

    pub const fn attributes(&self) -> [VertexAttribute; 2] {
        [self.position, self.texcoord]
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}
