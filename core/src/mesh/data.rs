//! CPU-side geometry buffers and primitive topologies.

use std::sync::Arc;

use super::layout::VertexLayout;

/// Primitive topology describing how vertices are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Like a strip, with a closing line back to the first vertex.
    LineLoop,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
    /// Triangles fan out from the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Number of primitives assembled from `vertex_count` vertices.
    ///
    /// Strip, fan and loop topologies with too few vertices yield zero
    /// primitives rather than underflowing.
    pub fn primitive_count(&self, vertex_count: u32) -> u32 {
        match self {
            Self::PointList => vertex_count,
            Self::LineList => vertex_count / 2,
            Self::LineStrip => vertex_count.saturating_sub(1),
            Self::LineLoop => vertex_count,
            Self::TriangleList => vertex_count / 3,
            Self::TriangleStrip | Self::TriangleFan => vertex_count.saturating_sub(2),
        }
    }
}

/// Index data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    #[default]
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// Size in bytes of one index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Interleaved vertex data plus its layout.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    /// Layout describing the interleaved attributes.
    pub layout: Arc<VertexLayout>,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Raw interleaved bytes, `vertex_count * layout.stride` long.
    pub data: Vec<u8>,
}

impl VertexBuffer {
    /// Create a vertex buffer, inferring the vertex count from the
    /// data length and layout stride.
    pub fn new(layout: Arc<VertexLayout>, data: Vec<u8>) -> Self {
        let vertex_count = if layout.stride > 0 {
            (data.len() / layout.stride as usize) as u32
        } else {
            0
        };
        Self {
            layout,
            vertex_count,
            data,
        }
    }

    /// Bytes of vertex `index`, or `None` past the end.
    pub fn vertex_bytes(&self, index: u32) -> Option<&[u8]> {
        if index >= self.vertex_count {
            return None;
        }
        let stride = self.layout.stride as usize;
        let start = index as usize * stride;
        Some(&self.data[start..start + stride])
    }
}

/// Index data plus its format.
#[derive(Debug, Clone)]
pub struct IndexBuffer {
    /// Index format.
    pub format: IndexFormat,
    /// Number of indices.
    pub index_count: u32,
    /// Raw index bytes.
    pub data: Vec<u8>,
}

impl IndexBuffer {
    /// Create an index buffer from u16 indices.
    pub fn from_u16(indices: &[u16]) -> Self {
        Self {
            format: IndexFormat::Uint16,
            index_count: indices.len() as u32,
            data: bytemuck::cast_slice(indices).to_vec(),
        }
    }

    /// Create an index buffer from u32 indices.
    pub fn from_u32(indices: &[u32]) -> Self {
        Self {
            format: IndexFormat::Uint32,
            index_count: indices.len() as u32,
            data: bytemuck::cast_slice(indices).to_vec(),
        }
    }

    /// Create an index buffer from raw bytes.
    pub fn from_raw(format: IndexFormat, index_count: u32, data: Vec<u8>) -> Self {
        Self {
            format,
            index_count,
            data,
        }
    }

    /// Index value at `i`, widened to u32.
    pub fn index(&self, i: u32) -> Option<u32> {
        if i >= self.index_count {
            return None;
        }
        let i = i as usize;
        match self.format {
            IndexFormat::Uint16 => {
                let b = [self.data[i * 2], self.data[i * 2 + 1]];
                Some(u32::from(u16::from_le_bytes(b)))
            }
            IndexFormat::Uint32 => {
                let b = [
                    self.data[i * 4],
                    self.data[i * 4 + 1],
                    self.data[i * 4 + 2],
                    self.data[i * 4 + 3],
                ];
                Some(u32::from_le_bytes(b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{VertexElement, VertexFormat, VertexSemantic};
    use rstest::rstest;

    #[rstest]
    #[case(PrimitiveTopology::PointList, 7, 7)]
    #[case(PrimitiveTopology::LineList, 8, 4)]
    #[case(PrimitiveTopology::LineStrip, 8, 7)]
    #[case(PrimitiveTopology::LineLoop, 8, 8)]
    #[case(PrimitiveTopology::TriangleList, 9, 3)]
    #[case(PrimitiveTopology::TriangleStrip, 9, 7)]
    #[case(PrimitiveTopology::TriangleFan, 9, 7)]
    #[case(PrimitiveTopology::TriangleStrip, 1, 0)]
    #[case(PrimitiveTopology::LineStrip, 0, 0)]
    fn test_primitive_count(
        #[case] topology: PrimitiveTopology,
        #[case] vertices: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(topology.primitive_count(vertices), expected);
    }

    #[test]
    fn test_vertex_buffer_count_inference() {
        let layout = Arc::new(VertexLayout::new(12).with_element(VertexElement::new(
            VertexSemantic::Position,
            VertexFormat::Float3,
            0,
        )));
        let vb = VertexBuffer::new(layout, vec![0u8; 36]);
        assert_eq!(vb.vertex_count, 3);
        assert_eq!(vb.vertex_bytes(2).unwrap().len(), 12);
        assert!(vb.vertex_bytes(3).is_none());
    }

    #[test]
    fn test_index_buffer_widening() {
        let ib = IndexBuffer::from_u16(&[0, 1, 7000]);
        assert_eq!(ib.format, IndexFormat::Uint16);
        assert_eq!(ib.index(2), Some(7000));
        assert_eq!(ib.index(3), None);

        let ib = IndexBuffer::from_u32(&[1 << 20]);
        assert_eq!(ib.index(0), Some(1 << 20));
    }
}
