//! Vertex layouts and CPU-side geometry buffers.
//!
//! - [`VertexLayout`] - Describes the attributes interleaved in a vertex buffer
//! - [`VertexBuffer`] / [`IndexBuffer`] - Raw geometry data plus metadata
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives

mod data;
mod layout;

pub use data::{IndexBuffer, IndexFormat, PrimitiveTopology, VertexBuffer};
pub use layout::{VertexElement, VertexFormat, VertexLayout, VertexSemantic};
