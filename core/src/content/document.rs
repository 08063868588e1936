//! Serde model of the JSON scene document.
//!
//! The document is the random-access companion of the binary stream:
//! top-level maps keyed by name, with every cross-reference expressed
//! as a string key resolved through the load session. An empty string
//! is the "no reference" sentinel everywhere a reference is optional.
//!
//! Raw buffer bytes are supplied out of band; the document only
//! declares their lengths so a mismatched upload fails early.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::buffer::{AttributeType, ComponentType};
use crate::mesh::PrimitiveTopology;

/// Root of a parsed JSON scene document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRoot {
    /// Declared raw buffers, index-addressed.
    #[serde(default)]
    pub buffers: Vec<DocBuffer>,
    /// Named byte-range slices of raw buffers.
    #[serde(default)]
    pub buffer_views: BTreeMap<String, DocBufferView>,
    /// Named typed views into buffer views.
    #[serde(default)]
    pub accessors: BTreeMap<String, DocAccessor>,
    /// Named meshes.
    #[serde(default)]
    pub meshes: BTreeMap<String, DocMesh>,
    /// Named materials.
    #[serde(default)]
    pub materials: BTreeMap<String, DocMaterial>,
    /// Named textures.
    #[serde(default)]
    pub textures: BTreeMap<String, DocTexture>,
    /// Named scene nodes.
    #[serde(default)]
    pub nodes: BTreeMap<String, DocNode>,
    /// Named skins.
    #[serde(default)]
    pub skins: BTreeMap<String, DocSkin>,
    /// Names of the scene's root nodes.
    #[serde(default)]
    pub scene: Vec<String>,
}

/// Declaration of one raw buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocBuffer {
    /// Expected byte length of the out-of-band buffer.
    pub byte_length: usize,
}

/// A byte-range slice of a raw buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocBufferView {
    /// Index into [`DocumentRoot::buffers`].
    pub buffer: usize,
    /// Byte offset of the slice.
    #[serde(default)]
    pub byte_offset: usize,
    /// Byte length of the slice.
    pub byte_length: usize,
}

/// Component type names accepted in accessor declarations.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocComponentType {
    /// Signed byte.
    I8,
    /// Unsigned byte.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
}

impl From<DocComponentType> for ComponentType {
    fn from(c: DocComponentType) -> Self {
        match c {
            DocComponentType::I8 => Self::I8,
            DocComponentType::U8 => Self::U8,
            DocComponentType::I16 => Self::I16,
            DocComponentType::U16 => Self::U16,
            DocComponentType::U32 => Self::U32,
            DocComponentType::F32 => Self::F32,
        }
    }
}

/// Attribute shape names accepted in accessor declarations.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocAttributeType {
    /// Single scalar.
    Scalar,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// 2x2 matrix.
    Mat2,
    /// 3x3 matrix.
    Mat3,
    /// 4x4 matrix.
    Mat4,
}

impl From<DocAttributeType> for AttributeType {
    fn from(a: DocAttributeType) -> Self {
        match a {
            DocAttributeType::Scalar => Self::Scalar,
            DocAttributeType::Vec2 => Self::Vector2,
            DocAttributeType::Vec3 => Self::Vector3,
            DocAttributeType::Vec4 => Self::Vector4,
            DocAttributeType::Mat2 => Self::Matrix2,
            DocAttributeType::Mat3 => Self::Matrix3,
            DocAttributeType::Mat4 => Self::Matrix4,
        }
    }
}

/// A typed view into a buffer view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocAccessor {
    /// Name of the buffer view this accessor reads.
    pub buffer_view: String,
    /// Byte offset of the first element within the view.
    #[serde(default)]
    pub byte_offset: usize,
    /// Declared stride; zero (or absent) means tightly packed.
    #[serde(default)]
    pub byte_stride: usize,
    /// Scalar component type.
    pub component_type: DocComponentType,
    /// Element shape.
    #[serde(rename = "type")]
    pub attribute_type: DocAttributeType,
    /// Number of elements.
    pub count: u32,
}

/// Topology names accepted in primitive declarations.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocTopology {
    /// Point list.
    Points,
    /// Line list.
    Lines,
    /// Line strip.
    LineStrip,
    /// Line loop.
    LineLoop,
    /// Triangle list.
    #[default]
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Triangle fan.
    TriangleFan,
}

impl From<DocTopology> for PrimitiveTopology {
    fn from(t: DocTopology) -> Self {
        match t {
            DocTopology::Points => Self::PointList,
            DocTopology::Lines => Self::LineList,
            DocTopology::LineStrip => Self::LineStrip,
            DocTopology::LineLoop => Self::LineLoop,
            DocTopology::Triangles => Self::TriangleList,
            DocTopology::TriangleStrip => Self::TriangleStrip,
            DocTopology::TriangleFan => Self::TriangleFan,
        }
    }
}

/// One attribute of a primitive group, in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct DocAttribute {
    /// Declared semantic name (position, normal, texcoord, ...).
    pub semantic: String,
    /// Name of the accessor supplying the data.
    pub accessor: String,
}

/// One primitive group of a mesh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocPrimitive {
    /// Attribute accessors in declaration order; the interleaved vertex
    /// layout follows this order.
    pub attributes: Vec<DocAttribute>,
    /// Index accessor name; empty for non-indexed groups.
    #[serde(default)]
    pub indices: String,
    /// Material name; empty for no material.
    #[serde(default)]
    pub material: String,
    /// Primitive topology.
    #[serde(default)]
    pub topology: DocTopology,
}

/// A mesh: an ordered list of primitive groups.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMesh {
    /// Primitive groups; each becomes one mesh part.
    #[serde(default)]
    pub primitives: Vec<DocPrimitive>,
}

/// A material declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMaterial {
    /// Texture name; empty for untextured.
    #[serde(default)]
    pub texture: String,
    /// Diffuse color.
    #[serde(default = "default_white")]
    pub diffuse: [f32; 3],
    /// Emissive color.
    #[serde(default)]
    pub emissive: [f32; 3],
    /// Specular color.
    #[serde(default)]
    pub specular: [f32; 3],
    /// Specular exponent.
    #[serde(default = "default_specular_power")]
    pub specular_power: f32,
    /// Opacity.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_specular_power() -> f32 {
    16.0
}

fn default_alpha() -> f32 {
    1.0
}

/// A texture declaration; mip bytes live in buffer views.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocTexture {
    /// Width in texels of mip 0.
    pub width: u32,
    /// Height in texels of mip 0.
    pub height: u32,
    /// Buffer view name per mip level, largest first.
    #[serde(default)]
    pub mips: Vec<String>,
}

/// A scene node declaration.
///
/// The transform is either `matrix` or the decomposed
/// translation/rotation/scale fields; supplying both is rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocNode {
    /// Explicit local matrix, column-major.
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    /// Decomposed translation.
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    /// Decomposed rotation quaternion `[x, y, z, w]`.
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    /// Decomposed per-axis scale.
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    /// Child node names.
    #[serde(default)]
    pub children: Vec<String>,
    /// Mesh names attached to this node.
    #[serde(default)]
    pub meshes: Vec<String>,
    /// Whether this node is a skeleton joint.
    #[serde(default)]
    pub joint: bool,
    /// Skin name; empty for unskinned nodes.
    #[serde(default)]
    pub skin: String,
}

/// A skin declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocSkin {
    /// Joint node names in traversal order; this order assigns joint
    /// indices and the bone-array row order.
    pub joints: Vec<String>,
    /// Accessor holding one inverse-bind mat4 per joint; empty means
    /// identity matrices.
    #[serde(default)]
    pub inverse_bind_matrices: String,
    /// Bind-shape matrix, column-major; absent means identity.
    #[serde(default)]
    pub bind_shape_matrix: Option<[f32; 16]>,
}
