//! Reference resolver and object cache for one load.
//!
//! A [`LoadSession`] wraps a single source (binary stream or JSON
//! document plus raw buffers) and guarantees that every reference path
//! naming the same entity observes the same `Arc`. Aborting a load
//! simply drops the session; objects already handed out stay alive.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::binary::BinaryDecoder;
use crate::content::document::DocumentRoot;
use crate::content::error::ContentError;
use crate::content::registry::{ContentKind, ContentObject, TypeReaderRegistry};
use crate::content::{BINARY_MAGIC, BINARY_VERSION};

/// Key identifying one entity within a load source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKey {
    /// 1-based table index, used by the binary path.
    Index(u32),
    /// Map key, used by the document path.
    Name(String),
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

struct CacheEntry {
    object: ContentObject,
    finalized: bool,
}

enum Source<'a> {
    Binary {
        decoder: BinaryDecoder<'a>,
        reader_names: Vec<String>,
    },
    Document {
        root: DocumentRoot,
        buffers: Vec<Vec<u8>>,
    },
}

/// One content load in progress: source, reader set, and object cache.
pub struct LoadSession<'a> {
    registry: &'a TypeReaderRegistry,
    source: Source<'a>,
    cache: HashMap<(ContentKind, ContentKey), CacheEntry>,
}

impl<'a> LoadSession<'a> {
    /// Opens a binary stream: validates the container header and reads
    /// the reader table, leaving the cursor at the primary object tag.
    pub fn from_binary(
        registry: &'a TypeReaderRegistry,
        data: &'a [u8],
    ) -> Result<Self, ContentError> {
        let mut decoder = BinaryDecoder::new(data);

        let magic = decoder.read_bytes(4)?;
        if magic != BINARY_MAGIC {
            return Err(ContentError::InvalidFormat(format!(
                "bad magic {magic:02x?}"
            )));
        }
        let version = decoder.read_u8()?;
        if version != BINARY_VERSION {
            return Err(ContentError::InvalidFormat(format!(
                "unsupported container version {version}"
            )));
        }
        let flags = decoder.read_u8()?;
        if flags != 0 {
            return Err(ContentError::InvalidFormat(format!(
                "reserved flags set: {flags:#04x}"
            )));
        }
        let declared = decoder.read_u32()? as usize;
        if declared != data.len() {
            return Err(ContentError::InvalidFormat(format!(
                "declared size {declared} does not match stream length {}",
                data.len()
            )));
        }

        let reader_count = decoder.read_7bit_u32()?;
        let mut reader_names = Vec::with_capacity(reader_count as usize);
        for _ in 0..reader_count {
            let name = decoder.read_string()?;
            let version = decoder.read_i32()?;
            debug!("reader table entry: {name} v{version}");
            reader_names.push(name);
        }

        Ok(Self {
            registry,
            source: Source::Binary {
                decoder,
                reader_names,
            },
            cache: HashMap::new(),
        })
    }

    /// Opens a JSON document. `buffers` supplies the raw bytes the
    /// document's buffer declarations describe, in declaration order.
    pub fn from_json(
        registry: &'a TypeReaderRegistry,
        json: &str,
        buffers: Vec<Vec<u8>>,
    ) -> Result<Self, ContentError> {
        let root: DocumentRoot = serde_json::from_str(json)?;

        if root.buffers.len() != buffers.len() {
            return Err(ContentError::InvalidFormat(format!(
                "document declares {} buffers, {} supplied",
                root.buffers.len(),
                buffers.len()
            )));
        }
        for (i, (decl, bytes)) in root.buffers.iter().zip(&buffers).enumerate() {
            if decl.byte_length != bytes.len() {
                return Err(ContentError::InvalidFormat(format!(
                    "buffer {i} declares {} bytes, {} supplied",
                    decl.byte_length,
                    bytes.len()
                )));
            }
        }

        Ok(Self {
            registry,
            source: Source::Document { root, buffers },
            cache: HashMap::new(),
        })
    }

    /// Reads the next polymorphic object from the binary stream.
    ///
    /// A zero type tag is the null object and yields `None`; any other
    /// tag is a 1-based index into the reader table.
    pub fn read_object(&mut self) -> Result<Option<ContentObject>, ContentError> {
        let registry = self.registry;
        let tag = self.decoder()?.read_7bit_u32()?;
        if tag == 0 {
            return Ok(None);
        }

        let name = match &self.source {
            Source::Binary { reader_names, .. } => reader_names
                .get(tag as usize - 1)
                .cloned()
                .ok_or_else(|| {
                    ContentError::InvalidFormat(format!(
                        "type tag {tag} outside reader table"
                    ))
                })?,
            Source::Document { .. } => {
                return Err(ContentError::Unsupported(
                    "no binary decoder in a document session".into(),
                ))
            }
        };

        let reader = registry.reader_named(&name)?;
        reader.read_binary(self).map(Some)
    }

    /// Resolves a reference, loading the target on first use.
    ///
    /// Every later resolve of the same key returns a clone of the same
    /// `Arc`; a key the source does not define is `ReferenceNotFound`.
    pub fn resolve(
        &mut self,
        kind: ContentKind,
        key: ContentKey,
    ) -> Result<ContentObject, ContentError> {
        if let Some(entry) = self.cache.get(&(kind, key.clone())) {
            return Ok(entry.object.clone());
        }

        let name = match (&self.source, &key) {
            (Source::Document { .. }, ContentKey::Name(name)) => name.clone(),
            // Binary references are table indices the owning reader
            // pre-populates; a miss means the stream never defined it.
            _ => return Err(ContentError::ReferenceNotFound { kind, key }),
        };

        let registry = self.registry;
        let reader = registry.reader_for_kind(kind)?;
        match reader.read_document(self, &name) {
            Ok(object) => {
                self.cache.insert(
                    (kind, key),
                    CacheEntry {
                        object: object.clone(),
                        finalized: true,
                    },
                );
                Ok(object)
            }
            Err(e) => {
                // Drop the reserved placeholder so a failed read never
                // leaves a half-built object resolvable.
                self.cache.remove(&(kind, key.clone()));
                // A miss for this very key already names it; anything
                // else gets the key attached so a decoder error deep in
                // a resolve chain stays diagnosable.
                match e {
                    ContentError::ReferenceNotFound {
                        kind: k,
                        key: ref missing,
                    } if k == kind && *missing == key => Err(e),
                    _ => Err(ContentError::ReadFailed {
                        kind,
                        key,
                        source: Box::new(e),
                    }),
                }
            }
        }
    }

    /// Inserts a finished object under a key, so later resolves hit it.
    pub fn insert(&mut self, kind: ContentKind, key: ContentKey, object: ContentObject) {
        self.cache.insert(
            (kind, key),
            CacheEntry {
                object,
                finalized: true,
            },
        );
    }

    /// Reserves a key with its placeholder object before the owning
    /// reader recurses, so self- and sibling references within the same
    /// resolution cycle observe the placeholder `Arc`.
    pub fn reserve(&mut self, kind: ContentKind, key: ContentKey, object: ContentObject) {
        self.cache.insert(
            (kind, key),
            CacheEntry {
                object,
                finalized: false,
            },
        );
    }

    /// Whether a key is reserved but not yet finalized. A true result
    /// means the reference is a back edge into an object still being
    /// read.
    pub fn in_progress(&self, kind: ContentKind, key: &ContentKey) -> bool {
        self.cache
            .get(&(kind, key.clone()))
            .is_some_and(|entry| !entry.finalized)
    }

    /// The binary decoder, positioned at the current read cursor.
    pub fn decoder(&mut self) -> Result<&mut BinaryDecoder<'a>, ContentError> {
        match &mut self.source {
            Source::Binary { decoder, .. } => Ok(decoder),
            Source::Document { .. } => Err(ContentError::Unsupported(
                "no binary decoder in a document session".into(),
            )),
        }
    }

    /// The parsed JSON document.
    pub fn document(&self) -> Result<&DocumentRoot, ContentError> {
        match &self.source {
            Source::Document { root, .. } => Ok(root),
            Source::Binary { .. } => Err(ContentError::Unsupported(
                "no document in a binary session".into(),
            )),
        }
    }

    /// The raw buffers backing the JSON document.
    pub fn buffers(&self) -> Result<&[Vec<u8>], ContentError> {
        match &self.source {
            Source::Document { buffers, .. } => Ok(buffers),
            Source::Binary { .. } => Err(ContentError::Unsupported(
                "no raw buffers in a binary session".into(),
            )),
        }
    }
}
