//! Readers for geometry buffers, textures, and materials.

use std::sync::Arc;

use crate::content::error::ContentError;
use crate::content::registry::{ContentKind, ContentObject, ContentTypeReader};
use crate::content::session::{ContentKey, LoadSession};
use crate::math::Vec3;
use crate::mesh::{
    IndexBuffer, IndexFormat, VertexBuffer, VertexElement, VertexFormat, VertexLayout,
    VertexSemantic,
};
use crate::model::{Material, Texture2d};

fn vertex_format_from_code(code: u8) -> Result<VertexFormat, ContentError> {
    match code {
        0 => Ok(VertexFormat::Float),
        1 => Ok(VertexFormat::Float2),
        2 => Ok(VertexFormat::Float3),
        3 => Ok(VertexFormat::Float4),
        4 => Ok(VertexFormat::Byte4),
        5 => Ok(VertexFormat::UByte4),
        6 => Ok(VertexFormat::Short2),
        7 => Ok(VertexFormat::UShort2),
        8 => Ok(VertexFormat::UShort4),
        other => Err(ContentError::InvalidFormat(format!(
            "unknown vertex format code {other}"
        ))),
    }
}

/// Binary layout: `u32` stride, 7-bit element count, per element a
/// semantic name + `u8` format code + `u32` offset, then a 7-bit
/// vertex count followed by `count * stride` raw bytes.
pub struct VertexBufferReader;

impl ContentTypeReader for VertexBufferReader {
    fn kind(&self) -> ContentKind {
        ContentKind::VertexBuffer
    }

    fn name(&self) -> &'static str {
        "glint.VertexBufferReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let decoder = session.decoder()?;

        let stride = decoder.read_u32()?;
        let element_count = decoder.read_7bit_u32()?;
        let mut layout = VertexLayout::new(stride);
        for _ in 0..element_count {
            let semantic = VertexSemantic::from_name(&decoder.read_string()?);
            let format = vertex_format_from_code(decoder.read_u8()?)?;
            let offset = decoder.read_u32()?;
            layout = layout.with_element(VertexElement::new(semantic, format, offset));
        }

        let vertex_count = decoder.read_7bit_u32()?;
        let data = decoder
            .read_bytes(vertex_count as usize * stride as usize)?
            .to_vec();

        Ok(ContentObject::VertexBuffer(Arc::new(VertexBuffer {
            layout: Arc::new(layout),
            vertex_count,
            data,
        })))
    }
}

/// Binary layout: `u8` format (0 = u16, 1 = u32), 7-bit index count,
/// then the raw index bytes.
pub struct IndexBufferReader;

impl ContentTypeReader for IndexBufferReader {
    fn kind(&self) -> ContentKind {
        ContentKind::IndexBuffer
    }

    fn name(&self) -> &'static str {
        "glint.IndexBufferReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let decoder = session.decoder()?;

        let format = match decoder.read_u8()? {
            0 => IndexFormat::Uint16,
            1 => IndexFormat::Uint32,
            other => {
                return Err(ContentError::InvalidFormat(format!(
                    "unknown index format code {other}"
                )))
            }
        };
        let index_count = decoder.read_7bit_u32()?;
        let data = decoder
            .read_bytes(index_count as usize * format.size())?
            .to_vec();

        Ok(ContentObject::IndexBuffer(Arc::new(IndexBuffer::from_raw(
            format,
            index_count,
            data,
        ))))
    }
}

/// Reads textures: raw mip bytes, no pixel-format decoding.
pub struct Texture2DReader;

impl ContentTypeReader for Texture2DReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Texture
    }

    fn name(&self) -> &'static str {
        "glint.Texture2DReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let decoder = session.decoder()?;

        let name = decoder.read_string()?;
        let width = decoder.read_u32()?;
        let height = decoder.read_u32()?;
        let mip_count = decoder.read_7bit_u32()?;
        let mut mips = Vec::with_capacity(mip_count as usize);
        for _ in 0..mip_count {
            let len = decoder.read_7bit_u32()? as usize;
            mips.push(decoder.read_bytes(len)?.to_vec());
        }

        Ok(ContentObject::Texture(Arc::new(Texture2d {
            name,
            width,
            height,
            mips,
        })))
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .textures
            .get(name)
            .cloned()
            .ok_or_else(|| ContentError::ReferenceNotFound {
                kind: ContentKind::Texture,
                key: ContentKey::Name(name.to_string()),
            })?;

        let mut views = Vec::with_capacity(decl.mips.len());
        for view_name in &decl.mips {
            let view = session
                .resolve(ContentKind::BufferView, ContentKey::Name(view_name.clone()))?
                .into_buffer_view()?;
            views.push(view);
        }

        let buffers = session.buffers()?;
        let mut mips = Vec::with_capacity(views.len());
        for view in &views {
            mips.push(view.slice(buffers)?.to_vec());
        }

        Ok(ContentObject::Texture(Arc::new(Texture2d {
            name: name.to_string(),
            width: decl.width,
            height: decl.height,
            mips,
        })))
    }
}

/// Reads materials. The binary path reads the texture polymorphically
/// (tag 0 = untextured); the document path resolves it by name.
pub struct MaterialReader;

impl ContentTypeReader for MaterialReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Material
    }

    fn name(&self) -> &'static str {
        "glint.MaterialReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let name = session.decoder()?.read_string()?;
        let texture = match session.read_object()? {
            Some(obj) => Some(obj.into_texture()?),
            None => None,
        };

        let decoder = session.decoder()?;
        let diffuse_color = decoder.read_vec3()?;
        let emissive_color = decoder.read_vec3()?;
        let specular_color = decoder.read_vec3()?;
        let specular_power = decoder.read_f32()?;
        let alpha = decoder.read_f32()?;

        Ok(ContentObject::Material(Arc::new(Material {
            name,
            texture,
            diffuse_color,
            emissive_color,
            specular_color,
            specular_power,
            alpha,
        })))
    }

    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let decl = session
            .document()?
            .materials
            .get(name)
            .cloned()
            .ok_or_else(|| ContentError::ReferenceNotFound {
                kind: ContentKind::Material,
                key: ContentKey::Name(name.to_string()),
            })?;

        let texture = if decl.texture.is_empty() {
            None
        } else {
            Some(
                session
                    .resolve(ContentKind::Texture, ContentKey::Name(decl.texture.clone()))?
                    .into_texture()?,
            )
        };

        Ok(ContentObject::Material(Arc::new(Material {
            name: name.to_string(),
            texture,
            diffuse_color: Vec3::new(decl.diffuse[0], decl.diffuse[1], decl.diffuse[2]),
            emissive_color: Vec3::new(decl.emissive[0], decl.emissive[1], decl.emissive[2]),
            specular_color: Vec3::new(decl.specular[0], decl.specular[1], decl.specular[2]),
            specular_power: decl.specular_power,
            alpha: decl.alpha,
        })))
    }
}
