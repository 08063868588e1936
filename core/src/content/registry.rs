//! Type-reader registry.
//!
//! Every loadable entity kind has exactly one reader. The registry is
//! consulted by name when decoding the binary reader table and by kind
//! when the resolver follows a document reference.

use std::sync::Arc;

use crate::buffer::{Accessor, BufferView};
use crate::content::error::ContentError;
use crate::content::readers;
use crate::content::session::LoadSession;
use crate::mesh::{IndexBuffer, VertexBuffer};
use crate::model::{Material, Model, ModelMesh, Node, Skeleton, Texture2d};

/// Kinds of objects the content pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A complete model with bones and meshes.
    Model,
    /// A single mesh.
    Mesh,
    /// A scene node.
    Node,
    /// A typed buffer accessor.
    Accessor,
    /// A byte-range buffer view.
    BufferView,
    /// A 2D texture.
    Texture,
    /// An index buffer.
    IndexBuffer,
    /// A vertex buffer.
    VertexBuffer,
    /// A material.
    Material,
    /// A skin (skeleton).
    Skin,
    /// A UTF-8 string primitive.
    String,
    /// A 32-bit integer primitive.
    Int32,
    /// A 32-bit float primitive.
    Single,
}

/// A loaded object, shared across every reference path that named it.
#[derive(Debug, Clone)]
pub enum ContentObject {
    /// See [`ContentKind::Model`].
    Model(Arc<Model>),
    /// See [`ContentKind::Mesh`].
    Mesh(Arc<ModelMesh>),
    /// See [`ContentKind::Node`].
    Node(Arc<Node>),
    /// See [`ContentKind::Accessor`].
    Accessor(Arc<Accessor>),
    /// See [`ContentKind::BufferView`].
    BufferView(Arc<BufferView>),
    /// See [`ContentKind::Texture`].
    Texture(Arc<Texture2d>),
    /// See [`ContentKind::IndexBuffer`].
    IndexBuffer(Arc<IndexBuffer>),
    /// See [`ContentKind::VertexBuffer`].
    VertexBuffer(Arc<VertexBuffer>),
    /// See [`ContentKind::Material`].
    Material(Arc<Material>),
    /// See [`ContentKind::Skin`].
    Skin(Arc<Skeleton>),
    /// See [`ContentKind::String`].
    String(Arc<String>),
    /// See [`ContentKind::Int32`].
    Int32(i32),
    /// See [`ContentKind::Single`].
    Single(f32),
}

macro_rules! content_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        /// Extracts the typed object, failing on a kind mismatch.
        pub fn $fn_name(self) -> Result<$ty, ContentError> {
            match self {
                Self::$variant(v) => Ok(v),
                other => Err(ContentError::Unsupported(format!(
                    "expected {:?} object, got {:?}",
                    ContentKind::$variant,
                    other.kind()
                ))),
            }
        }
    };
}

impl ContentObject {
    /// The kind of the contained object.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Model(_) => ContentKind::Model,
            Self::Mesh(_) => ContentKind::Mesh,
            Self::Node(_) => ContentKind::Node,
            Self::Accessor(_) => ContentKind::Accessor,
            Self::BufferView(_) => ContentKind::BufferView,
            Self::Texture(_) => ContentKind::Texture,
            Self::IndexBuffer(_) => ContentKind::IndexBuffer,
            Self::VertexBuffer(_) => ContentKind::VertexBuffer,
            Self::Material(_) => ContentKind::Material,
            Self::Skin(_) => ContentKind::Skin,
            Self::String(_) => ContentKind::String,
            Self::Int32(_) => ContentKind::Int32,
            Self::Single(_) => ContentKind::Single,
        }
    }

    content_accessor!(into_model, Model, Arc<Model>);
    content_accessor!(into_mesh, Mesh, Arc<ModelMesh>);
    content_accessor!(into_node, Node, Arc<Node>);
    content_accessor!(into_accessor, Accessor, Arc<Accessor>);
    content_accessor!(into_buffer_view, BufferView, Arc<BufferView>);
    content_accessor!(into_texture, Texture, Arc<Texture2d>);
    content_accessor!(into_index_buffer, IndexBuffer, Arc<IndexBuffer>);
    content_accessor!(into_vertex_buffer, VertexBuffer, Arc<VertexBuffer>);
    content_accessor!(into_material, Material, Arc<Material>);
    content_accessor!(into_skin, Skin, Arc<Skeleton>);
    content_accessor!(into_string, String, Arc<String>);
    content_accessor!(into_i32, Int32, i32);
    content_accessor!(into_f32, Single, f32);
}

/// A reader that produces one object kind from either load path.
///
/// The default implementations reject the path; each built-in overrides
/// the paths that make sense for its kind.
pub trait ContentTypeReader: Send + Sync {
    /// Kind of object this reader produces.
    fn kind(&self) -> ContentKind;

    /// Name used in binary reader tables.
    fn name(&self) -> &'static str;

    /// Reads one object from the session's binary decoder, cursor at
    /// the start of the object body.
    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let _ = session;
        Err(ContentError::Unsupported(format!(
            "{} has no binary representation",
            self.name()
        )))
    }

    /// Reads the named object out of the session's JSON document.
    fn read_document(
        &self,
        session: &mut LoadSession<'_>,
        name: &str,
    ) -> Result<ContentObject, ContentError> {
        let _ = (session, name);
        Err(ContentError::Unsupported(format!(
            "{} has no document representation",
            self.name()
        )))
    }
}

/// Owns the reader set for a load session.
pub struct TypeReaderRegistry {
    readers: Vec<Box<dyn ContentTypeReader>>,
}

impl TypeReaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Creates a registry with every built-in reader registered.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(readers::ModelReader));
        registry.register(Box::new(readers::MeshReader));
        registry.register(Box::new(readers::NodeReader));
        registry.register(Box::new(readers::AccessorReader));
        registry.register(Box::new(readers::BufferViewReader));
        registry.register(Box::new(readers::Texture2DReader));
        registry.register(Box::new(readers::IndexBufferReader));
        registry.register(Box::new(readers::VertexBufferReader));
        registry.register(Box::new(readers::MaterialReader));
        registry.register(Box::new(readers::SkinReader));
        registry.register(Box::new(readers::StringReader));
        registry.register(Box::new(readers::Int32Reader));
        registry.register(Box::new(readers::SingleReader));
        registry
    }

    /// Adds a reader. A later registration for the same kind or name
    /// shadows the earlier one.
    pub fn register(&mut self, reader: Box<dyn ContentTypeReader>) {
        self.readers.push(reader);
    }

    /// Looks up a reader by its binary table name.
    pub fn reader_named(&self, name: &str) -> Result<&dyn ContentTypeReader, ContentError> {
        self.readers
            .iter()
            .rev()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ContentError::UnknownReaderType(name.to_string()))
    }

    /// Looks up the reader producing `kind`.
    pub fn reader_for_kind(
        &self,
        kind: ContentKind,
    ) -> Result<&dyn ContentTypeReader, ContentError> {
        self.readers
            .iter()
            .rev()
            .find(|r| r.kind() == kind)
            .map(|r| r.as_ref())
            .ok_or_else(|| ContentError::UnknownReaderType(format!("{kind:?}")))
    }
}

impl Default for TypeReaderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
