//! Scene-graph assembly: turning a load session into a node tree,
//! skeletons, and interleaved vertex buffers.
//!
//! Skins are bound in a second pass after the whole node tree exists,
//! so joint local-to-root transforms are computed against fully wired
//! parents.

use std::sync::Arc;

use log::debug;

use crate::buffer::{Accessor, AttributeType, ComponentType};
use crate::content::{ContentError, ContentKey, ContentKind, LoadSession};
use crate::math::Mat4;
use crate::mesh::{VertexBuffer, VertexElement, VertexFormat, VertexLayout, VertexSemantic};
use crate::model::{Node, Skeleton, SkeletonJoint};

/// A loaded scene: the document's root nodes, fully wired.
#[derive(Debug)]
pub struct Scene {
    /// Root nodes in declaration order.
    pub roots: Vec<Arc<Node>>,
}

/// Loads the scene a JSON document describes.
///
/// First resolves every root node (which recursively builds the node
/// tree), then binds skins to the nodes that declare them.
pub fn load_scene(session: &mut LoadSession<'_>) -> Result<Scene, ContentError> {
    let doc = session.document()?;
    let root_names = doc.scene.clone();
    let skinned: Vec<(String, String)> = doc
        .nodes
        .iter()
        .filter(|(_, node)| !node.skin.is_empty())
        .map(|(name, node)| (name.clone(), node.skin.clone()))
        .collect();

    let mut roots = Vec::with_capacity(root_names.len());
    for name in root_names {
        let node = session
            .resolve(ContentKind::Node, ContentKey::Name(name))?
            .into_node()?;
        roots.push(node);
    }

    for (node_name, skin_name) in skinned {
        debug!("binding skin {skin_name:?} to node {node_name:?}");
        let node = session
            .resolve(ContentKind::Node, ContentKey::Name(node_name))?
            .into_node()?;
        let skin = session
            .resolve(ContentKind::Skin, ContentKey::Name(skin_name))?
            .into_skin()?;
        node.set_skin(skin);
    }

    Ok(Scene { roots })
}

/// Builds the skeleton a skin declaration describes.
///
/// Joint names are resolved to their nodes and assigned zero-based
/// indices in declaration order; that order is the bone-array row
/// order from here on. The inverse-bind accessor must supply at least
/// one mat4 per joint; an empty reference means identity matrices.
pub fn build_skeleton(
    session: &mut LoadSession<'_>,
    name: &str,
) -> Result<Arc<Skeleton>, ContentError> {
    let decl = session
        .document()?
        .skins
        .get(name)
        .cloned()
        .ok_or_else(|| ContentError::ReferenceNotFound {
            kind: ContentKind::Skin,
            key: ContentKey::Name(name.to_string()),
        })?;

    let mut joints = Vec::with_capacity(decl.joints.len());
    for (index, joint_name) in decl.joints.iter().enumerate() {
        let node = session
            .resolve(ContentKind::Node, ContentKey::Name(joint_name.clone()))?
            .into_node()?;
        node.set_joint_index(index);
        joints.push(SkeletonJoint { node, index });
    }

    let inverse_bind_matrices = if decl.inverse_bind_matrices.is_empty() {
        vec![Mat4::identity(); joints.len()]
    } else {
        let accessor = session
            .resolve(
                ContentKind::Accessor,
                ContentKey::Name(decl.inverse_bind_matrices.clone()),
            )?
            .into_accessor()?;
        if (accessor.count as usize) < joints.len() {
            return Err(ContentError::InvalidFormat(format!(
                "skin {name:?} has {} joints but accessor {:?} holds {} matrices",
                joints.len(),
                accessor.name,
                accessor.count
            )));
        }
        let buffers = session.buffers()?;
        let mut matrices = Vec::with_capacity(joints.len());
        for i in 0..joints.len() {
            matrices.push(accessor.read_mat4(i as u32, buffers)?);
        }
        matrices
    };

    let bind_shape_matrix = decl
        .bind_shape_matrix
        .map(|m| Mat4::from_column_slice(&m))
        .unwrap_or_else(Mat4::identity);

    Ok(Arc::new(Skeleton::new(
        joints,
        inverse_bind_matrices,
        bind_shape_matrix,
    )))
}

/// Interleaves attribute streams into one vertex buffer.
///
/// Per vertex, each accessor contributes `byte_stride()` bytes in
/// declaration order; the destination stride is the sum of those
/// strides and the derived layout places each attribute at its running
/// offset. All accessors must agree on the element count.
pub fn interleave_attributes(
    attributes: &[(VertexSemantic, Arc<Accessor>)],
    buffers: &[Vec<u8>],
) -> Result<VertexBuffer, ContentError> {
    let first = attributes
        .first()
        .ok_or_else(|| ContentError::InvalidFormat("no attributes to interleave".into()))?;
    let vertex_count = first.1.count;

    let mut stride = 0u32;
    let mut layout = VertexLayout::new(0);
    for (semantic, accessor) in attributes {
        if accessor.count != vertex_count {
            return Err(ContentError::InvalidFormat(format!(
                "accessor {:?} has {} elements, expected {vertex_count}",
                accessor.name, accessor.count
            )));
        }
        let format = attribute_format(accessor.attribute_type, accessor.component_type)?;
        layout = layout.with_element(VertexElement::new(*semantic, format, stride));
        stride += accessor.byte_stride() as u32;
    }
    layout.stride = stride;

    let mut data = Vec::with_capacity(vertex_count as usize * stride as usize);
    for vertex in 0..vertex_count {
        for (_, accessor) in attributes {
            let bytes = accessor.element_bytes(vertex, buffers)?;
            data.extend_from_slice(bytes);
            // Source views may omit trailing pad bytes on the last
            // element; the destination keeps the full stride.
            data.resize(data.len() + accessor.byte_stride() - bytes.len(), 0);
        }
    }

    Ok(VertexBuffer {
        layout: Arc::new(layout),
        vertex_count,
        data,
    })
}

/// Maps an accessor's element shape to a vertex element format.
pub fn attribute_format(
    attribute_type: AttributeType,
    component_type: ComponentType,
) -> Result<VertexFormat, ContentError> {
    match (attribute_type, component_type) {
        (AttributeType::Scalar, ComponentType::F32) => Ok(VertexFormat::Float),
        (AttributeType::Vector2, ComponentType::F32) => Ok(VertexFormat::Float2),
        (AttributeType::Vector3, ComponentType::F32) => Ok(VertexFormat::Float3),
        (AttributeType::Vector4, ComponentType::F32) => Ok(VertexFormat::Float4),
        (AttributeType::Vector4, ComponentType::I8) => Ok(VertexFormat::Byte4),
        (AttributeType::Vector4, ComponentType::U8) => Ok(VertexFormat::UByte4),
        (AttributeType::Vector2, ComponentType::I16) => Ok(VertexFormat::Short2),
        (AttributeType::Vector2, ComponentType::U16) => Ok(VertexFormat::UShort2),
        (AttributeType::Vector4, ComponentType::U16) => Ok(VertexFormat::UShort4),
        (at, ct) => Err(ContentError::Unsupported(format!(
            "no vertex format for {at:?} of {ct:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferView;

    fn f32_accessor(
        name: &str,
        attribute_type: AttributeType,
        count: u32,
        offset: usize,
        view_len: usize,
    ) -> Arc<Accessor> {
        let view = Arc::new(BufferView {
            name: format!("{name}_view"),
            buffer: 0,
            offset,
            length: view_len,
        });
        Arc::new(Accessor::new(
            name,
            view,
            attribute_type,
            ComponentType::F32,
            count,
            0,
            0,
        ))
    }

    #[test]
    fn test_interleave_position_texcoord() {
        // Two vertices: positions then texcoords, stored planar.
        let mut bytes = Vec::new();
        for v in [
            [1.0f32, 2.0, 3.0],
            [4.0, 5.0, 6.0],
        ] {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for v in [[0.1f32, 0.2], [0.3, 0.4]] {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        let buffers = vec![bytes];

        let attributes = vec![
            (
                VertexSemantic::Position,
                f32_accessor("pos", AttributeType::Vector3, 2, 0, 24),
            ),
            (
                VertexSemantic::TexCoord,
                f32_accessor("uv", AttributeType::Vector2, 2, 24, 16),
            ),
        ];
        let vb = interleave_attributes(&attributes, &buffers).unwrap();

        assert_eq!(vb.layout.stride, 20);
        assert_eq!(vb.data.len(), 40);
        assert_eq!(vb.vertex_count, 2);
        assert_eq!(vb.layout.elements[1].offset, 12);

        // Vertex 1's texcoord sits at byte 32.
        let u = f32::from_le_bytes([vb.data[32], vb.data[33], vb.data[34], vb.data[35]]);
        assert_eq!(u, 0.3);
    }

    #[test]
    fn test_interleave_rejects_count_mismatch() {
        let buffers = vec![vec![0u8; 64]];
        let attributes = vec![
            (
                VertexSemantic::Position,
                f32_accessor("pos", AttributeType::Vector3, 2, 0, 24),
            ),
            (
                VertexSemantic::Normal,
                f32_accessor("nrm", AttributeType::Vector3, 3, 24, 36),
            ),
        ];
        assert!(matches!(
            interleave_attributes(&attributes, &buffers),
            Err(ContentError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_interleave_rejects_empty() {
        assert!(interleave_attributes(&[], &[]).is_err());
    }

    #[test]
    fn test_attribute_format_mapping() {
        assert_eq!(
            attribute_format(AttributeType::Vector3, ComponentType::F32).unwrap(),
            VertexFormat::Float3
        );
        assert_eq!(
            attribute_format(AttributeType::Vector4, ComponentType::U8).unwrap(),
            VertexFormat::UByte4
        );
        assert!(attribute_format(AttributeType::Matrix4, ComponentType::F32).is_err());
    }
}
