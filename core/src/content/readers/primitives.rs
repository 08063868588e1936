//! Readers for primitive values embedded in binary streams.

use std::sync::Arc;

use crate::content::error::ContentError;
use crate::content::registry::{ContentKind, ContentObject, ContentTypeReader};
use crate::content::session::LoadSession;

/// Reads a length-prefixed UTF-8 string.
pub struct StringReader;

impl ContentTypeReader for StringReader {
    fn kind(&self) -> ContentKind {
        ContentKind::String
    }

    fn name(&self) -> &'static str {
        "glint.StringReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        let value = session.decoder()?.read_string()?;
        Ok(ContentObject::String(Arc::new(value)))
    }
}

/// Reads a little-endian `i32`.
pub struct Int32Reader;

impl ContentTypeReader for Int32Reader {
    fn kind(&self) -> ContentKind {
        ContentKind::Int32
    }

    fn name(&self) -> &'static str {
        "glint.Int32Reader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        Ok(ContentObject::Int32(session.decoder()?.read_i32()?))
    }
}

/// Reads a little-endian `f32`.
pub struct SingleReader;

impl ContentTypeReader for SingleReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Single
    }

    fn name(&self) -> &'static str {
        "glint.SingleReader"
    }

    fn read_binary(
        &self,
        session: &mut LoadSession<'_>,
    ) -> Result<ContentObject, ContentError> {
        Ok(ContentObject::Single(session.decoder()?.read_f32()?))
    }
}
