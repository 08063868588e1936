//! Sequential binary decoder for content streams.
//!
//! [`BinaryDecoder`] maintains a monotonically advancing cursor over a
//! finite byte slice. All fixed-width reads are little-endian. Variable
//! length integers use the base-128 scheme (7 payload bits per byte,
//! high bit signals continuation, least significant group first), and
//! strings are length-prefixed with such an integer.

use byteorder::{ByteOrder, LittleEndian};

use crate::content::ContentError;
use crate::math::{Mat4, Quat, Vec2, Vec3, Vec4, quat_from_xyzw};

/// Sequential cursor over a byte slice.
///
/// Reading past the end of the source fails with
/// [`ContentError::OutOfRange`]; the cursor is left unchanged by a
/// failed read and [`position`](Self::position) stays queryable for
/// diagnostics.
pub struct BinaryDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryDecoder<'a> {
    /// Create a decoder positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor offset from the start of the source.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take `count` raw bytes, advancing the cursor.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ContentError> {
        if self.pos + count > self.data.len() {
            return Err(ContentError::OutOfRange {
                offset: self.pos,
                wanted: count,
                len: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, ContentError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read one signed byte.
    pub fn read_i8(&mut self) -> Result<i8, ContentError> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, ContentError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// Read a little-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, ContentError> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, ContentError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Read a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, ContentError> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, ContentError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Read a little-endian i64.
    pub fn read_i64(&mut self) -> Result<i64, ContentError> {
        Ok(LittleEndian::read_i64(self.read_bytes(8)?))
    }

    /// Read a little-endian f32.
    pub fn read_f32(&mut self) -> Result<f32, ContentError> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    /// Read a little-endian f64.
    pub fn read_f64(&mut self) -> Result<f64, ContentError> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    /// Read a 7-bit variable-length-encoded unsigned integer.
    ///
    /// Each byte contributes 7 payload bits, least significant group
    /// first; the high bit signals continuation. More than 5 bytes
    /// cannot encode a u32 and is rejected as malformed.
    pub fn read_7bit_u32(&mut self) -> Result<u32, ContentError> {
        let mut result: u32 = 0;
        let mut shift = 0;
        loop {
            if shift > 28 {
                return Err(ContentError::InvalidFormat(format!(
                    "7-bit encoded integer at offset {} exceeds 32 bits",
                    self.pos
                )));
            }
            let byte = self.read_u8()?;
            result |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// The prefix is a 7-bit encoded byte length. The payload is decoded
    /// one code point at a time: the run of high bits in the leading
    /// byte gives the sequence length, and every continuation byte must
    /// carry the `10xxxxxx` marker. Malformed sequences fail with
    /// [`ContentError::InvalidFormat`].
    pub fn read_string(&mut self) -> Result<String, ContentError> {
        let start = self.pos;
        let len = self.read_7bit_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        decode_utf8(bytes).ok_or_else(|| {
            ContentError::InvalidFormat(format!("invalid UTF-8 in string at offset {start}"))
        })
    }

    /// Read two f32 as a [`Vec2`].
    pub fn read_vec2(&mut self) -> Result<Vec2, ContentError> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    /// Read three f32 as a [`Vec3`].
    pub fn read_vec3(&mut self) -> Result<Vec3, ContentError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read four f32 as a [`Vec4`].
    pub fn read_vec4(&mut self) -> Result<Vec4, ContentError> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// Read a quaternion as x, y, z, w.
    pub fn read_quat(&mut self) -> Result<Quat, ContentError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        let w = self.read_f32()?;
        Ok(quat_from_xyzw(x, y, z, w))
    }

    /// Read 16 f32 as a column-major [`Mat4`].
    pub fn read_mat4(&mut self) -> Result<Mat4, ContentError> {
        let mut values = [0.0f32; 16];
        for v in values.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(Mat4::from_column_slice(&values))
    }
}

/// Append the 7-bit variable-length encoding of `value` to `out`.
///
/// Counterpart of [`BinaryDecoder::read_7bit_u32`], used by fixture
/// builders and round-trip tests.
pub fn encode_7bit_u32(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Manual UTF-8 decode, one code point at a time.
///
/// Returns `None` on malformed sequences (bad leading byte, missing or
/// malformed continuation bytes, overlong encodings, surrogate or
/// out-of-range code points).
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let mut result = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        // Length of the sequence is the run of high bits in the lead
        // byte; `min` is the first code point that actually needs that
        // many bytes, so anything below it is an overlong encoding.
        let (len, min, mut cp) = match lead.leading_ones() {
            0 => (1, 0, u32::from(lead)),
            2 => (2, 0x80, u32::from(lead & 0x1f)),
            3 => (3, 0x800, u32::from(lead & 0x0f)),
            4 => (4, 0x1_0000, u32::from(lead & 0x07)),
            _ => return None,
        };
        if i + len > bytes.len() {
            return None;
        }
        for &cont in &bytes[i + 1..i + len] {
            if cont & 0xc0 != 0x80 {
                return None;
            }
            cp = (cp << 6) | u32::from(cont & 0x3f);
        }
        if cp < min {
            return None;
        }
        result.push(char::from_u32(cp)?);
        i += len;
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_reads() {
        let data = [0x01, 0x02, 0x00, 0x00, 0x00, 0x80, 0x3f];
        let mut d = BinaryDecoder::new(&data);
        assert_eq!(d.read_u8().unwrap(), 1);
        assert_eq!(d.read_u16().unwrap(), 2);
        assert_eq!(d.read_f32().unwrap(), 1.0);
        assert_eq!(d.position(), 7);
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x01, 0x02];
        let mut d = BinaryDecoder::new(&data);
        let err = d.read_u32().unwrap_err();
        match err {
            ContentError::OutOfRange {
                offset,
                wanted,
                len,
            } => {
                assert_eq!((offset, wanted, len), (0, 4, 2));
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
        // Failed read leaves the cursor untouched.
        assert_eq!(d.position(), 0);
        assert_eq!(d.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_7bit_known_encodings() {
        let mut d = BinaryDecoder::new(&[0x00]);
        assert_eq!(d.read_7bit_u32().unwrap(), 0);

        let mut d = BinaryDecoder::new(&[0x7f]);
        assert_eq!(d.read_7bit_u32().unwrap(), 127);

        // 128 = 0x80 0x01
        let mut d = BinaryDecoder::new(&[0x80, 0x01]);
        assert_eq!(d.read_7bit_u32().unwrap(), 128);

        // u32::MAX takes five bytes
        let mut d = BinaryDecoder::new(&[0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(d.read_7bit_u32().unwrap(), u32::MAX);
    }

    #[test]
    fn test_7bit_overlong_rejected() {
        let mut d = BinaryDecoder::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(matches!(
            d.read_7bit_u32(),
            Err(ContentError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_7bit_round_trip_property() {
        // Deterministic LCG sweep plus the boundary values.
        let mut cases = vec![0u32, 1, 127, 128, 16383, 16384, u32::MAX - 1, u32::MAX];
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            cases.push((state >> 32) as u32);
        }
        for value in cases {
            let mut bytes = Vec::new();
            encode_7bit_u32(value, &mut bytes);
            assert!(bytes.len() <= 5);
            let mut d = BinaryDecoder::new(&bytes);
            assert_eq!(d.read_7bit_u32().unwrap(), value, "value {value}");
            assert_eq!(d.remaining(), 0);
        }
    }

    #[test]
    fn test_read_string_ascii_and_multibyte() {
        let mut data = Vec::new();
        let payload = "héllo ✓".as_bytes();
        encode_7bit_u32(payload.len() as u32, &mut data);
        data.extend_from_slice(payload);
        let mut d = BinaryDecoder::new(&data);
        assert_eq!(d.read_string().unwrap(), "héllo ✓");
    }

    #[test]
    fn test_read_string_invalid_utf8() {
        // Length 2, lead byte promises a 2-byte sequence but the
        // continuation marker is missing.
        let data = [0x02, 0xc3, 0x28];
        let mut d = BinaryDecoder::new(&data);
        assert!(matches!(
            d.read_string(),
            Err(ContentError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_read_string_rejects_overlong_utf8() {
        // U+0000 smuggled as a 2-byte sequence.
        let data = [0x02, 0xc0, 0x80];
        let mut d = BinaryDecoder::new(&data);
        assert!(matches!(
            d.read_string(),
            Err(ContentError::InvalidFormat(_))
        ));

        // '/' (U+002F) padded out to a 3-byte sequence.
        let data = [0x03, 0xe0, 0x80, 0xaf];
        let mut d = BinaryDecoder::new(&data);
        assert!(matches!(
            d.read_string(),
            Err(ContentError::InvalidFormat(_))
        ));

        // The shortest forms still decode.
        let data = [0x03, 0x00, 0xc2, 0x80];
        let mut d = BinaryDecoder::new(&data);
        assert_eq!(d.read_string().unwrap(), "\u{0}\u{80}");
    }

    #[test]
    fn test_read_string_truncated_payload() {
        let data = [0x05, b'a', b'b'];
        let mut d = BinaryDecoder::new(&data);
        assert!(matches!(d.read_string(), Err(ContentError::OutOfRange { .. })));
    }

    #[test]
    fn test_read_mat4_column_major() {
        let mut data = Vec::new();
        for i in 0..16 {
            data.extend_from_slice(&(i as f32).to_le_bytes());
        }
        let mut d = BinaryDecoder::new(&data);
        let m = d.read_mat4().unwrap();
        // First column is the first four floats.
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(3, 0)], 3.0);
        assert_eq!(m[(0, 1)], 4.0);
    }

    #[test]
    fn test_read_vectors() {
        let mut data = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut d = BinaryDecoder::new(&data);
        let q = d.read_quat().unwrap();
        assert_eq!(q.coords.x, 1.0);
        assert_eq!(q.coords.w, 4.0);
    }
}
