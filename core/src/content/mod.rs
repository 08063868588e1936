//! Content load sessions.
//!
//! A load session turns one serialized document into a graph of shared
//! runtime objects:
//!
//! - [`document`] - the serde model of the JSON scene document
//! - [`registry`] - the type-reader registry dispatching by kind or by
//!   reader name (binary type tags)
//! - typed readers in [`readers`], one per entity kind
//! - [`LoadSession`] - owns the object cache and drives resolution
//!
//! The session owns its object cache for exactly one load: aborting a
//! load drops the session and everything reachable only through its
//! cache, while objects already handed out stay alive through their
//! `Arc`s.

pub mod document;
mod error;
pub mod readers;
pub mod registry;
mod session;

pub use error::ContentError;
pub use registry::{ContentKind, ContentObject, ContentTypeReader, TypeReaderRegistry};
pub use session::{ContentKey, LoadSession};

/// Magic bytes opening a binary content stream.
pub const BINARY_MAGIC: [u8; 4] = *b"GLNT";

/// Current binary container format version.
pub const BINARY_VERSION: u8 = 1;
