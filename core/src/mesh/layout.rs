//! Vertex declaration types.
//!
//! A [`VertexLayout`] names each attribute interleaved in a vertex
//! buffer: its semantic role, element format, and byte offset within
//! the vertex stride. Layouts are shared via `Arc` so multiple mesh
//! parts can compare them by pointer.

/// Semantic role of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    /// Vertex position (typically float3).
    Position,
    /// Vertex normal (typically float3).
    Normal,
    /// Vertex tangent.
    Tangent,
    /// Vertex binormal (bitangent).
    Binormal,
    /// Texture coordinates.
    TexCoord,
    /// Bone indices for skinning.
    BlendIndices,
    /// Bone weights for skinning.
    BlendWeight,
    /// Vertex color.
    Color,
}

impl VertexSemantic {
    /// Map a declared semantic name to a semantic role.
    ///
    /// Unrecognized names degrade to [`VertexSemantic::Color`] with a
    /// warning; leaving the slot populated is safer than aborting mesh
    /// construction.
    pub fn from_name(name: &str) -> Self {
        match name {
            "position" => Self::Position,
            "normal" => Self::Normal,
            "tangent" => Self::Tangent,
            "binormal" => Self::Binormal,
            "texcoord" => Self::TexCoord,
            "blendindices" => Self::BlendIndices,
            "blendweight" => Self::BlendWeight,
            "color" => Self::Color,
            other => {
                log::warn!("unrecognized vertex semantic {other:?}, defaulting to color");
                Self::Color
            }
        }
    }
}

/// Element format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One f32.
    Float,
    /// Two f32.
    Float2,
    /// Three f32.
    Float3,
    /// Four f32.
    Float4,
    /// Four i8.
    Byte4,
    /// Four u8.
    UByte4,
    /// Two i16.
    Short2,
    /// Two u16.
    UShort2,
    /// Four u16.
    UShort4,
}

impl VertexFormat {
    /// Size in bytes of one element.
    pub fn size(&self) -> usize {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Byte4 | Self::UByte4 => 4,
            Self::Short2 | Self::UShort2 => 4,
            Self::UShort4 => 8,
        }
    }
}

/// One attribute within a vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// Semantic role.
    pub semantic: VertexSemantic,
    /// Element format.
    pub format: VertexFormat,
    /// Byte offset within the vertex stride.
    pub offset: u32,
}

impl VertexElement {
    /// Create a new element.
    pub fn new(semantic: VertexSemantic, format: VertexFormat, offset: u32) -> Self {
        Self {
            semantic,
            format,
            offset,
        }
    }
}

/// Declaration of the attributes interleaved in one vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes from one vertex to the next.
    pub stride: u32,
    /// Attributes in declaration order.
    pub elements: Vec<VertexElement>,
}

impl VertexLayout {
    /// Create an empty layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            elements: Vec::new(),
        }
    }

    /// Append an element.
    #[must_use]
    pub fn with_element(mut self, element: VertexElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Find the element with the given semantic, if present.
    pub fn element(&self, semantic: VertexSemantic) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }
}
