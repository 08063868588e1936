//! Binary model reader.
//!
//! A model package stores its bone table, material table, and mesh
//! table sequentially; every cross-reference inside the package is a
//! 1-based 7-bit id into the owning table, with 0 reserved for "none".

use std::sync::{Arc, OnceLock};

use crate::content::error::ContentError;
use crate::content::registry::{ContentKind, ContentObject, ContentTypeReader};
use crate::content::session::{ContentKey, LoadSession};
use crate::mesh::PrimitiveTopology;
use crate::model::{MeshPart, Model, ModelBone, ModelMesh};

fn topology_from_code(code: u8) -> Result<PrimitiveTopology, ContentError> {
    match code {
        0 => Ok(PrimitiveTopology::PointList),
        1 => Ok(PrimitiveTopology::LineList),
        2 => Ok(PrimitiveTopology::LineStrip),
        3 => Ok(PrimitiveTopology::LineLoop),
        4 => Ok(PrimitiveTopology::TriangleList),
        5 => Ok(PrimitiveTopology::TriangleStrip),
        6 => Ok(PrimitiveTopology::TriangleFan),
        other => Err(ContentError::InvalidFormat(format!(
            "unknown topology code {other}"
        ))),
    }
}

/// Resolves a 1-based table id, treating 0 as "none".
fn table_ref<'a, T>(table: &'a [Arc<T>], id: u32, what: &str) -> Result<Option<&'a Arc<T>>, ContentError> {
    if id == 0 {
        return Ok(None);
    }
    table
        .get(id as usize - 1)
        .map(Some)
        .ok_or_else(|| {
            ContentError::InvalidFormat(format!(
                "{what} id {id} outside table of {}",
                table.len()
            ))
        })
}

/// Reads a complete model: bones with hierarchy, shared materials,
/// and meshes with their draw parts.
pub struct ModelReader;

impl ContentTypeReader for ModelReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Model
    }

    fn name(&self) -> &'static str {
        "glint.ModelReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        // Bone table, then hierarchy wiring by id.
        let decoder = session.decoder()?;
        let bone_count = decoder.read_7bit_u32()?;
        let mut bones = Vec::with_capacity(bone_count as usize);
        for index in 0..bone_count {
            let name = decoder.read_string()?;
            let transform = decoder.read_mat4()?;
            bones.push(Arc::new(ModelBone::new(name, transform, index as usize)));
        }

        for index in 0..bone_count as usize {
            let parent_id = decoder.read_7bit_u32()?;
            if let Some(parent) = table_ref(&bones, parent_id, "parent bone")? {
                bones[index].set_parent(parent);
            }

            let child_count = decoder.read_7bit_u32()?;
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                let child_id = decoder.read_7bit_u32()?;
                let child = table_ref(&bones, child_id, "child bone")?.ok_or_else(|| {
                    ContentError::InvalidFormat("child bone id 0 in child list".into())
                })?;
                children.push(Arc::clone(child));
            }
            bones[index].set_children(children);
        }

        let root_id = decoder.read_7bit_u32()?;
        let root_bone = table_ref(&bones, root_id, "root bone")?.cloned();

        // Material table: each entry is a polymorphic object, cached by
        // its 1-based id so parts citing the same id share the instance.
        let material_count = session.decoder()?.read_7bit_u32()?;
        for id in 1..=material_count {
            let object = session.read_object()?.ok_or_else(|| {
                ContentError::InvalidFormat("null object in material table".into())
            })?;
            session.insert(ContentKind::Material, ContentKey::Index(id), object);
        }

        // Mesh table.
        let mesh_count = session.decoder()?.read_7bit_u32()?;
        let mut meshes = Vec::with_capacity(mesh_count as usize);
        for _ in 0..mesh_count {
            let decoder = session.decoder()?;
            let name = decoder.read_string()?;
            let parent_bone_id = decoder.read_7bit_u32()?;
            let part_count = decoder.read_7bit_u32()?;

            let mut parts = Vec::with_capacity(part_count as usize);
            for _ in 0..part_count {
                parts.push(read_part(session)?);
            }

            let mesh = ModelMesh {
                name,
                parent_bone: OnceLock::new(),
                parts,
            };
            if let Some(bone) = table_ref(&bones, parent_bone_id, "mesh parent bone")? {
                let _ = mesh.parent_bone.set(Arc::downgrade(bone));
            }
            meshes.push(Arc::new(mesh));
        }

        Ok(ContentObject::Model(Arc::new(Model {
            bones,
            root_bone,
            meshes,
        })))
    }
}

fn read_part(session: &mut LoadSession<'_>) -> Result<MeshPart, ContentError> {
    let vertex_buffer = session
        .read_object()?
        .ok_or_else(|| ContentError::InvalidFormat("mesh part without vertex buffer".into()))?
        .into_vertex_buffer()?;
    let index_buffer = session
        .read_object()?
        .ok_or_else(|| ContentError::InvalidFormat("mesh part without index buffer".into()))?
        .into_index_buffer()?;

    let decoder = session.decoder()?;
    let topology = topology_from_code(decoder.read_u8()?)?;
    let vertex_count = decoder.read_7bit_u32()?;
    let material_id = decoder.read_7bit_u32()?;

    let material = if material_id == 0 {
        None
    } else {
        Some(
            session
                .resolve(ContentKind::Material, ContentKey::Index(material_id))?
                .into_material()?,
        )
    };

    Ok(MeshPart {
        vertex_buffer,
        index_buffer,
        topology,
        vertex_count,
        primitive_count: topology.primitive_count(vertex_count),
        material,
    })
}
