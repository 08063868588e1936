//! Document-path readers for scene entities.
//!
//! These readers never construct a referenced entity directly: every
//! cross-reference goes back through the session's resolver, so two
//! paths naming the same entity share one `Arc`.

use std::sync::{Arc, OnceLock};

use log::warn;

use crate::assembler;
use crate::buffer::{Accessor, AttributeType, BufferView, ComponentType};
use crate::content::error::ContentError;
use crate::content::registry::{ContentKind, ContentObject, ContentTypeReader};
use crate::content::session::{ContentKey, LoadSession};
use crate::mesh::{IndexBuffer, PrimitiveTopology, VertexSemantic};
use crate::model::{MeshPart, ModelMesh, Node, NodeTransform};

fn missing(kind: ContentKind, name: &str) -> ContentError {
    ContentError::ReferenceNotFound {
        kind,
        key: ContentKey::Name(name.to_string()),
    }
}

/// Reads buffer views out of the document.
pub struct BufferViewReader;

impl ContentTypeReader for BufferViewReader {
    fn kind(&self) -> ContentKind {
        ContentKind::BufferView
    }

    fn name(&self) -> &'static str {
        "glint.BufferViewReader"
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .buffer_views
            .get(name)
            .cloned()
            .ok_or_else(|| missing(ContentKind::BufferView, name))?;

        Ok(ContentObject::BufferView(Arc::new(BufferView {
            name: name.to_string(),
            buffer: decl.buffer,
            offset: decl.byte_offset,
            length: decl.byte_length,
        })))
    }
}

/// Reads accessors, resolving their buffer view through the cache.
pub struct AccessorReader;

impl ContentTypeReader for AccessorReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Accessor
    }

    fn name(&self) -> &'static str {
        "glint.AccessorReader"
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .accessors
            .get(name)
            .cloned()
            .ok_or_else(|| missing(ContentKind::Accessor, name))?;

        let view = session
            .resolve(
                ContentKind::BufferView,
                ContentKey::Name(decl.buffer_view.clone()),
            )?
            .into_buffer_view()?;

        Ok(ContentObject::Accessor(Arc::new(Accessor::new(
            name,
            view,
            decl.attribute_type.into(),
            decl.component_type.into(),
            decl.count,
            decl.byte_offset,
            decl.byte_stride,
        ))))
    }
}

/// Reads meshes: interleaves each primitive group's attribute streams
/// into one vertex buffer and builds its index buffer and material.
pub struct MeshReader;

impl ContentTypeReader for MeshReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Mesh
    }

    fn name(&self) -> &'static str {
        "glint.MeshReader"
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .meshes
            .get(name)
            .cloned()
            .ok_or_else(|| missing(ContentKind::Mesh, name))?;

        let mut parts = Vec::with_capacity(decl.primitives.len());
        for prim in &decl.primitives {
            let mut attributes = Vec::with_capacity(prim.attributes.len());
            for attr in &prim.attributes {
                let accessor = session
                    .resolve(
                        ContentKind::Accessor,
                        ContentKey::Name(attr.accessor.clone()),
                    )?
                    .into_accessor()?;
                attributes.push((VertexSemantic::from_name(&attr.semantic), accessor));
            }
            let vertex_buffer = Arc::new(assembler::interleave_attributes(
                &attributes,
                session.buffers()?,
            )?);

            // Indexed parts draw index_count elements, non-indexed ones
            // walk the vertices directly.
            let (index_buffer, drawn) = if prim.indices.is_empty() {
                (
                    Arc::new(sequential_indices(vertex_buffer.vertex_count)),
                    vertex_buffer.vertex_count,
                )
            } else {
                let accessor = session
                    .resolve(
                        ContentKind::Accessor,
                        ContentKey::Name(prim.indices.clone()),
                    )?
                    .into_accessor()?;
                let ib = index_buffer_from_accessor(&accessor, session.buffers()?)?;
                (Arc::new(ib), accessor.count)
            };

            let material = if prim.material.is_empty() {
                None
            } else {
                Some(
                    session
                        .resolve(
                            ContentKind::Material,
                            ContentKey::Name(prim.material.clone()),
                        )?
                        .into_material()?,
                )
            };

            let topology: PrimitiveTopology = prim.topology.into();
            parts.push(MeshPart {
                vertex_count: vertex_buffer.vertex_count,
                primitive_count: topology.primitive_count(drawn),
                vertex_buffer,
                index_buffer,
                topology,
                material,
            });
        }

        Ok(ContentObject::Mesh(Arc::new(ModelMesh {
            name: name.to_string(),
            parent_bone: OnceLock::new(),
            parts,
        })))
    }
}

fn sequential_indices(vertex_count: u32) -> IndexBuffer {
    if vertex_count <= u32::from(u16::MAX) + 1 {
        let indices: Vec<u16> = (0..vertex_count).map(|i| i as u16).collect();
        IndexBuffer::from_u16(&indices)
    } else {
        let indices: Vec<u32> = (0..vertex_count).collect();
        IndexBuffer::from_u32(&indices)
    }
}

fn index_buffer_from_accessor(
    accessor: &Accessor,
    buffers: &[Vec<u8>],
) -> Result<IndexBuffer, ContentError> {
    if accessor.attribute_type != AttributeType::Scalar {
        return Err(ContentError::Unsupported(format!(
            "index accessor {:?} is {:?}, expected Scalar",
            accessor.name, accessor.attribute_type
        )));
    }
    let format = match accessor.component_type {
        ComponentType::U16 => crate::mesh::IndexFormat::Uint16,
        ComponentType::U32 => crate::mesh::IndexFormat::Uint32,
        other => {
            return Err(ContentError::Unsupported(format!(
                "index accessor {:?} has component type {other:?}",
                accessor.name
            )))
        }
    };

    let mut data = Vec::with_capacity(accessor.count as usize * format.size());
    for i in 0..accessor.count {
        data.extend_from_slice(accessor.element_bytes(i, buffers)?);
    }
    Ok(IndexBuffer::from_raw(format, accessor.count, data))
}

/// Reads scene nodes, recursively resolving children and meshes.
///
/// The node is reserved in the cache before its children resolve, so a
/// reference back into an ancestor is recognized as a back edge and
/// dropped from the child list instead of forming an ownership cycle.
pub struct NodeReader;

impl ContentTypeReader for NodeReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Node
    }

    fn name(&self) -> &'static str {
        "glint.NodeReader"
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| missing(ContentKind::Node, name))?;

        let has_trs =
            decl.translation.is_some() || decl.rotation.is_some() || decl.scale.is_some();
        let transform = match (decl.matrix, has_trs) {
            (Some(_), true) => {
                return Err(ContentError::InvalidFormat(format!(
                    "node {name:?} declares both a matrix and decomposed transforms"
                )))
            }
            (Some(m), false) => NodeTransform::Matrix(crate::math::Mat4::from_column_slice(&m)),
            (None, true) => NodeTransform::Decomposed {
                translation: decl.translation.unwrap_or([0.0; 3]),
                rotation: decl.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]),
                scale: decl.scale.unwrap_or([1.0; 3]),
            },
            (None, false) => NodeTransform::IDENTITY,
        };

        let node = Arc::new(Node::new(name, transform, decl.joint));
        session.reserve(
            ContentKind::Node,
            ContentKey::Name(name.to_string()),
            ContentObject::Node(Arc::clone(&node)),
        );

        let mut meshes = Vec::with_capacity(decl.meshes.len());
        for mesh_name in &decl.meshes {
            let mesh = session
                .resolve(ContentKind::Mesh, ContentKey::Name(mesh_name.clone()))?
                .into_mesh()?;
            meshes.push(mesh);
        }
        node.set_meshes(meshes);

        let mut children = Vec::with_capacity(decl.children.len());
        for child_name in &decl.children {
            let key = ContentKey::Name(child_name.clone());
            if session.in_progress(ContentKind::Node, &key) {
                warn!("dropping back edge from node {name:?} to {child_name:?}");
                continue;
            }
            let child = session.resolve(ContentKind::Node, key)?.into_node()?;
            child.set_parent(&node);
            children.push(child);
        }
        node.set_children(children);

        Ok(ContentObject::Node(node))
    }
}

/// Reads skins by delegating to the assembler's skeleton builder.
pub struct SkinReader;

impl ContentTypeReader for SkinReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Skin
    }

    fn name(&self) -> &'static str {
        "glint.SkinReader"
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        assembler::build_skeleton(session, name).map(ContentObject::Skin)
    }
}
