//! Runtime entities produced by the content pipeline.
//!
//! All cross-references use `Arc` for strong (owning) edges and `Weak`
//! for parent back-references, so the bone and node hierarchies can be
//! traversed in both directions without reference cycles. Fields wired
//! after construction (children, parents, skins) sit behind `OnceLock`:
//! set exactly once during assembly, immutable afterwards.

mod bone;
mod node;
mod skeleton;

pub use bone::ModelBone;
pub use node::{Node, NodeTransform};
pub use skeleton::{Skeleton, SkeletonJoint};

use std::sync::{Arc, OnceLock, Weak};

use crate::math::Vec3;
use crate::mesh::{IndexBuffer, PrimitiveTopology, VertexBuffer};

/// A complete renderable model: bone hierarchy plus meshes.
#[derive(Debug)]
pub struct Model {
    /// All bones in table order (the order bone ids refer to).
    pub bones: Vec<Arc<ModelBone>>,
    /// The root bone, if the model has a skeleton.
    pub root_bone: Option<Arc<ModelBone>>,
    /// All meshes in declaration order.
    pub meshes: Vec<Arc<ModelMesh>>,
}

/// A mesh: an ordered list of parts drawn with one bone's transform.
#[derive(Debug)]
pub struct ModelMesh {
    /// Mesh name.
    pub name: String,
    /// Bone this mesh is attached to, if any.
    pub parent_bone: OnceLock<Weak<ModelBone>>,
    /// Draw batches in declaration order.
    pub parts: Vec<MeshPart>,
}

impl ModelMesh {
    /// The parent bone, upgraded; `None` if unset or dropped.
    pub fn parent_bone(&self) -> Option<Arc<ModelBone>> {
        self.parent_bone.get().and_then(Weak::upgrade)
    }
}

/// One draw batch: a vertex buffer, an index buffer, and a material.
#[derive(Debug)]
pub struct MeshPart {
    /// Vertex data for this part.
    pub vertex_buffer: Arc<VertexBuffer>,
    /// Index data for this part.
    pub index_buffer: Arc<IndexBuffer>,
    /// How the indexed vertices assemble into primitives.
    pub topology: PrimitiveTopology,
    /// Number of vertices referenced by this part.
    pub vertex_count: u32,
    /// Number of primitives this part draws.
    pub primitive_count: u32,
    /// Material, shared when several parts cite the same one.
    pub material: Option<Arc<Material>>,
}

/// Surface parameters for a mesh part.
///
/// One material instance may back multiple parts; referrers share it
/// through the load session's object cache.
#[derive(Debug)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Base color texture, if any.
    pub texture: Option<Arc<Texture2d>>,
    /// Diffuse color.
    pub diffuse_color: Vec3,
    /// Emissive color.
    pub emissive_color: Vec3,
    /// Specular color.
    pub specular_color: Vec3,
    /// Specular exponent.
    pub specular_power: f32,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
}

/// A 2D texture: dimensions plus raw mip-level bytes.
///
/// Pixel-format decoding happens outside the pipeline; the loader
/// retains the bytes exactly as stored.
#[derive(Debug)]
pub struct Texture2d {
    /// Texture name.
    pub name: String,
    /// Width in texels of mip 0.
    pub width: u32,
    /// Height in texels of mip 0.
    pub height: u32,
    /// Raw bytes per mip level, largest first.
    pub mips: Vec<Vec<u8>>,
}
