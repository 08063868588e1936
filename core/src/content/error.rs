//! Error types for content loading.

use crate::content::registry::ContentKind;
use crate::content::session::ContentKey;

/// Errors that can occur while loading a content document.
///
/// All of these are fatal for the enclosing load; a partially resolved
/// object graph is unsafe to hand to the renderer, so nothing is retried.
#[derive(Debug)]
pub enum ContentError {
    /// Bad magic, bad version, or a structurally broken stream.
    InvalidFormat(String),
    /// A decoder read past the end of the source.
    OutOfRange {
        /// Cursor position at the failing read.
        offset: usize,
        /// Bytes the read needed.
        wanted: usize,
        /// Total length of the source.
        len: usize,
    },
    /// A reference key was absent from the document.
    ReferenceNotFound {
        /// Entity kind the reference named.
        kind: ContentKind,
        /// The offending key.
        key: ContentKey,
    },
    /// A reader failed while producing the object for a key. Carries
    /// the key being resolved so a decoder error deep in a resolve
    /// chain still names the object that triggered it.
    ReadFailed {
        /// Entity kind being read.
        kind: ContentKind,
        /// Key the failed object was being resolved under.
        key: ContentKey,
        /// The reader's underlying error.
        source: Box<ContentError>,
    },
    /// No reader is registered for a type tag or reader name.
    UnknownReaderType(String),
    /// A reader produced an object of an unexpected kind, or a field
    /// holds a value the schema does not allow.
    Unsupported(String),
    /// Failed to parse the JSON document.
    Json(serde_json::Error),
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(msg) => write!(f, "invalid format: {msg}"),
            Self::OutOfRange {
                offset,
                wanted,
                len,
            } => write!(
                f,
                "read of {wanted} bytes at offset {offset} past end of {len}-byte source"
            ),
            Self::ReferenceNotFound { kind, key } => {
                write!(f, "reference not found: {kind:?} {key}")
            }
            Self::ReadFailed { kind, key, source } => {
                write!(f, "while reading {kind:?} {key}: {source}")
            }
            Self::UnknownReaderType(name) => write!(f, "no reader for type: {name}"),
            Self::Unsupported(msg) => write!(f, "unsupported content: {msg}"),
            Self::Json(e) => write!(f, "JSON document error: {e}"),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::ReadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
