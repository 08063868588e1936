//! Typed views into raw byte buffers.
//!
//! A [`BufferView`] names a byte range of a raw buffer; an [`Accessor`]
//! describes how to read one attribute stream out of a view: element
//! shape, component type, count, offset and stride.

use std::sync::Arc;

use crate::content::ContentError;
use crate::math::Mat4;

/// A named slice `(offset, length)` into a raw byte buffer.
///
/// Immutable once constructed. The buffer itself is owned by the load
/// session and addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    /// View name.
    pub name: String,
    /// Index of the raw buffer this view slices.
    pub buffer: usize,
    /// Byte offset of the slice within the buffer.
    pub offset: usize,
    /// Byte length of the slice.
    pub length: usize,
}

impl BufferView {
    /// Resolve this view against the raw buffers of a load session.
    pub fn slice<'a>(&self, buffers: &'a [Vec<u8>]) -> Result<&'a [u8], ContentError> {
        let data = buffers.get(self.buffer).ok_or_else(|| {
            ContentError::InvalidFormat(format!(
                "buffer view {:?} references buffer {} of {}",
                self.name,
                self.buffer,
                buffers.len()
            ))
        })?;
        if self.offset + self.length > data.len() {
            return Err(ContentError::OutOfRange {
                offset: self.offset,
                wanted: self.length,
                len: data.len(),
            });
        }
        Ok(&data[self.offset..self.offset + self.length])
    }
}

/// Component type of one attribute scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
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

impl ComponentType {
    /// Size in bytes of one component.
    pub fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Shape of one attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Single scalar.
    Scalar,
    /// Two components.
    Vector2,
    /// Three components.
    Vector3,
    /// Four components.
    Vector4,
    /// 2x2 matrix.
    Matrix2,
    /// 3x3 matrix.
    Matrix3,
    /// 4x4 matrix.
    Matrix4,
}

impl AttributeType {
    /// Number of scalar components per element.
    pub fn component_count(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
            Self::Matrix2 => 4,
            Self::Matrix3 => 9,
            Self::Matrix4 => 16,
        }
    }
}

/// A typed, strided view describing one attribute stream.
#[derive(Debug, Clone)]
pub struct Accessor {
    /// Accessor name.
    pub name: String,
    /// The buffer view this accessor reads from.
    pub view: Arc<BufferView>,
    /// Element shape.
    pub attribute_type: AttributeType,
    /// Scalar component type.
    pub component_type: ComponentType,
    /// Number of elements.
    pub count: u32,
    /// Byte offset of the first element within the view.
    pub byte_offset: usize,
    /// Declared byte stride; zero means tightly packed.
    declared_stride: usize,
}

impl Accessor {
    /// Create an accessor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        view: Arc<BufferView>,
        attribute_type: AttributeType,
        component_type: ComponentType,
        count: u32,
        byte_offset: usize,
        declared_stride: usize,
    ) -> Self {
        Self {
            name: name.into(),
            view,
            attribute_type,
            component_type,
            count,
            byte_offset,
            declared_stride,
        }
    }

    /// Size in bytes of one tightly packed element.
    pub fn element_size(&self) -> usize {
        self.attribute_type.component_count() * self.component_type.size()
    }

    /// Distance in bytes between consecutive elements.
    ///
    /// Returns the declared stride if non-zero, otherwise derives it as
    /// `component_count(attribute_type) * component_size(component_type)`.
    /// This derived value is the interleave stride consumers must use.
    pub fn byte_stride(&self) -> usize {
        if self.declared_stride != 0 {
            self.declared_stride
        } else {
            self.element_size()
        }
    }

    /// Bytes of element `index`, bounds-checked against the view.
    pub fn element_bytes<'a>(
        &self,
        index: u32,
        buffers: &'a [Vec<u8>],
    ) -> Result<&'a [u8], ContentError> {
        if index >= self.count {
            return Err(ContentError::OutOfRange {
                offset: index as usize,
                wanted: 1,
                len: self.count as usize,
            });
        }
        let view = self.view.slice(buffers)?;
        let start = self.byte_offset + index as usize * self.byte_stride();
        let size = self.element_size().min(self.byte_stride());
        if start + size > view.len() {
            return Err(ContentError::OutOfRange {
                offset: start,
                wanted: size,
                len: view.len(),
            });
        }
        Ok(&view[start..start + size])
    }

    /// Read element `index` as a column-major [`Mat4`].
    pub fn read_mat4(&self, index: u32, buffers: &[Vec<u8>]) -> Result<Mat4, ContentError> {
        if self.attribute_type != AttributeType::Matrix4 || self.component_type != ComponentType::F32
        {
            return Err(ContentError::Unsupported(format!(
                "accessor {:?} is {:?}/{:?}, not a float Matrix4",
                self.name, self.attribute_type, self.component_type
            )));
        }
        let bytes = self.element_bytes(index, buffers)?;
        let mut values = [0.0f32; 16];
        for (i, v) in values.iter_mut().enumerate() {
            let b = [
                bytes[i * 4],
                bytes[i * 4 + 1],
                bytes[i * 4 + 2],
                bytes[i * 4 + 3],
            ];
            *v = f32::from_le_bytes(b);
        }
        Ok(Mat4::from_column_slice(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_view(length: usize) -> Arc<BufferView> {
        Arc::new(BufferView {
            name: "test".into(),
            buffer: 0,
            offset: 0,
            length,
        })
    }

    #[test]
    fn test_derived_stride_vector3_f32() {
        let acc = Accessor::new(
            "positions",
            test_view(0),
            AttributeType::Vector3,
            ComponentType::F32,
            0,
            0,
            0,
        );
        assert_eq!(acc.byte_stride(), 12);
    }

    #[test]
    fn test_explicit_stride_wins() {
        let acc = Accessor::new(
            "positions",
            test_view(0),
            AttributeType::Vector3,
            ComponentType::F32,
            0,
            0,
            16,
        );
        assert_eq!(acc.byte_stride(), 16);
    }

    #[test]
    fn test_component_and_attribute_sizes() {
        assert_eq!(ComponentType::U16.size(), 2);
        assert_eq!(AttributeType::Matrix4.component_count(), 16);
        assert_eq!(AttributeType::Matrix3.component_count(), 9);
    }

    #[test]
    fn test_element_bytes_strided() {
        // Two vec2<u16> elements padded to stride 8.
        let buffers = vec![vec![
            1, 0, 2, 0, 0xaa, 0xaa, 0xaa, 0xaa, //
            3, 0, 4, 0, 0xbb, 0xbb, 0xbb, 0xbb,
        ]];
        let acc = Accessor::new(
            "uv",
            test_view(16),
            AttributeType::Vector2,
            ComponentType::U16,
            2,
            0,
            8,
        );
        assert_eq!(acc.element_bytes(1, &buffers).unwrap(), &[3, 0, 4, 0]);
        assert!(matches!(
            acc.element_bytes(2, &buffers),
            Err(ContentError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_view_out_of_range() {
        let buffers = vec![vec![0u8; 8]];
        let view = BufferView {
            name: "v".into(),
            buffer: 0,
            offset: 4,
            length: 8,
        };
        assert!(matches!(
            view.slice(&buffers),
            Err(ContentError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_read_mat4_element() {
        let mut data = Vec::new();
        for i in 0..32 {
            data.extend_from_slice(&(i as f32).to_le_bytes());
        }
        let buffers = vec![data];
        let acc = Accessor::new(
            "ibm",
            test_view(128),
            AttributeType::Matrix4,
            ComponentType::F32,
            2,
            0,
            0,
        );
        assert_eq!(acc.byte_stride(), 64);
        let m = acc.read_mat4(1, &buffers).unwrap();
        assert_eq!(m[(0, 0)], 16.0);
        assert_eq!(m[(3, 3)], 31.0);
    }
}
