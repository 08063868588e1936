//! Built-in typed readers.
//!
//! Each reader produces one [`ContentKind`](crate::content::ContentKind)
//! from the paths that make sense for it: binary streams for
//! model-package types, the JSON document for scene types, both for
//! materials and textures.

mod geometry;
mod model;
mod primitives;
mod scene;

pub use geometry::{IndexBufferReader, MaterialReader, Texture2DReader, VertexBufferReader};
pub use model::ModelReader;
pub use primitives::{Int32Reader, SingleReader, StringReader};
pub use scene::{AccessorReader, BufferViewReader, MeshReader, NodeReader, SkinReader};
