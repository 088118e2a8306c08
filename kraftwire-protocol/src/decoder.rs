//! Read side of the binary cursor.
//!
//! A [`Decoder`] owns an immutable [`Bytes`] buffer and an offset. Every read
//! checks the remaining length first, so running off the end of a frame is a
//! [`ProtocolError::Truncated`] instead of a panic.
//!
//! All fixed-width integers are big-endian. Variable-length integers follow
//! the protocol's base-128 encoding: the low 7 bits of each byte carry payload
//! and the high bit marks continuation. Signed varints are zig-zag encoded.

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{ProtocolError, ProtocolResult};

/// Maximum encoded width of a 32-bit varint.
const VARINT_BYTES_MAX: usize = 5;

/// Maximum encoded width of a 64-bit varlong.
const VARLONG_BYTES_MAX: usize = 10;

/// Cursor over an immutable request or log buffer.
#[derive(Debug, Clone)]
pub struct Decoder {
    buf: Bytes,
    offset: usize,
}

impl Decoder {
    /// Creates a decoder positioned at the start of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            offset: 0,
        }
    }

    /// Current offset from the start of the buffer.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns true once every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> ProtocolResult<&[u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(ProtocolError::Truncated {
                offset: self.offset,
                needed: len,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.buf[start..self.offset])
    }

    fn take_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn get_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a signed byte.
    ///
    /// # Errors
    /// Returns `Truncated` if the buffer is exhausted.
    pub fn get_i8(&mut self) -> ProtocolResult<i8> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i16`.
    ///
    /// # Errors
    /// Returns `Truncated` if fewer than 2 bytes remain.
    pub fn get_i16(&mut self) -> ProtocolResult<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i32`.
    ///
    /// # Errors
    /// Returns `Truncated` if fewer than 4 bytes remain.
    pub fn get_i32(&mut self) -> ProtocolResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i64`.
    ///
    /// # Errors
    /// Returns `Truncated` if fewer than 8 bytes remain.
    pub fn get_i64(&mut self) -> ProtocolResult<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Reads an unsigned base-128 varint of at most 5 bytes.
    ///
    /// # Errors
    /// Returns `Truncated` on a cut-off varint and `VarintTooLong` when the
    /// encoding does not fit in 32 bits.
    pub fn get_uvarint(&mut self) -> ProtocolResult<u32> {
        let start = self.offset;
        let mut value = 0_u32;
        for i in 0..VARINT_BYTES_MAX {
            let byte = self.get_u8()?;
            if i == VARINT_BYTES_MAX - 1 && (byte & 0xf0) != 0 {
                return Err(ProtocolError::VarintTooLong { offset: start });
            }
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::VarintTooLong { offset: start })
    }

    /// Reads an unsigned base-128 varlong of at most 10 bytes.
    ///
    /// # Errors
    /// Returns `Truncated` on a cut-off varlong and `VarlongTooLong` when the
    /// encoding does not fit in 64 bits.
    pub fn get_uvarlong(&mut self) -> ProtocolResult<u64> {
        let start = self.offset;
        let mut value = 0_u64;
        for i in 0..VARLONG_BYTES_MAX {
            let byte = self.get_u8()?;
            if i == VARLONG_BYTES_MAX - 1 && (byte & 0xfe) != 0 {
                return Err(ProtocolError::VarlongTooLong { offset: start });
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::VarlongTooLong { offset: start })
    }

    /// Reads a zig-zag encoded signed varint.
    ///
    /// # Errors
    /// Same as [`Decoder::get_uvarint`].
    pub fn get_varint(&mut self) -> ProtocolResult<i32> {
        self.get_uvarint().map(zigzag_decode_i32)
    }

    /// Reads a zig-zag encoded signed varlong.
    ///
    /// # Errors
    /// Same as [`Decoder::get_uvarlong`].
    pub fn get_varlong(&mut self) -> ProtocolResult<i64> {
        self.get_uvarlong().map(zigzag_decode_i64)
    }

    /// Reads a compact array length: the wire value minus one.
    ///
    /// A wire value of 0 yields -1 (null array).
    ///
    /// # Errors
    /// Returns an error if the varint is malformed or does not fit in `i32`.
    pub fn get_compact_array_len(&mut self) -> ProtocolResult<i32> {
        let offset = self.offset;
        let raw = self.get_uvarint()?;
        let length = i64::from(raw) - 1;
        i32::try_from(length).map_err(|_| ProtocolError::InvalidLength { offset, length })
    }

    /// Reads a compact array length and treats null as zero elements.
    ///
    /// # Errors
    /// Same as [`Decoder::get_compact_array_len`].
    pub fn get_compact_array_count(&mut self) -> ProtocolResult<usize> {
        let length = self.get_compact_array_len()?;
        Ok(usize::try_from(length).unwrap_or(0))
    }

    /// Reads a compact (varint length + 1) UTF-8 string.
    ///
    /// # Errors
    /// Returns `InvalidCompactLength` for a null string, `InvalidString` for
    /// bad UTF-8, or `Truncated` if the payload is cut off.
    pub fn get_compact_string(&mut self) -> ProtocolResult<String> {
        let offset = self.offset;
        let length = self.get_compact_array_len()?;
        let Ok(length) = usize::try_from(length) else {
            return Err(ProtocolError::InvalidCompactLength { offset, raw: 0 });
        };
        self.get_utf8(length)
    }

    /// Reads a classic nullable string with an `i16` length prefix.
    ///
    /// # Errors
    /// Returns `InvalidLength` for lengths below -1, `InvalidString` for bad
    /// UTF-8, or `Truncated` if the payload is cut off.
    pub fn get_string(&mut self) -> ProtocolResult<Option<String>> {
        let offset = self.offset;
        let length = self.get_i16()?;
        if length == -1 {
            return Ok(None);
        }
        let Ok(length) = usize::try_from(length) else {
            return Err(ProtocolError::InvalidLength {
                offset,
                length: i64::from(length),
            });
        };
        self.get_utf8(length).map(Some)
    }

    fn get_utf8(&mut self, length: usize) -> ProtocolResult<String> {
        let offset = self.offset;
        let raw = self.take(length)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidString { offset })
    }

    /// Reads a tagged-field block and requires it to be empty.
    ///
    /// Tag payload parsing is not supported, so any non-zero tag count is a
    /// fatal decode fault.
    ///
    /// # Errors
    /// Returns `NonEmptyTaggedFields` if the block carries tags.
    pub fn get_empty_tagged_fields(&mut self) -> ProtocolResult<()> {
        let offset = self.offset;
        let count = self.get_uvarint()?;
        if count != 0 {
            return Err(ProtocolError::NonEmptyTaggedFields { offset, count });
        }
        Ok(())
    }

    /// Returns the next `len` bytes as a view into the underlying buffer.
    ///
    /// # Errors
    /// Returns `Truncated` if fewer than `len` bytes remain.
    pub fn get_bytes(&mut self, len: usize) -> ProtocolResult<Bytes> {
        let start = self.offset;
        self.take(len)?;
        Ok(self.buf.slice(start..self.offset))
    }

    /// Reads bytes with a zig-zag varint length prefix; -1 means null.
    ///
    /// # Errors
    /// Returns `InvalidLength` for lengths below -1 or `Truncated` if the
    /// payload is cut off.
    pub fn get_varint_nullable_bytes(&mut self) -> ProtocolResult<Option<Bytes>> {
        let offset = self.offset;
        let length = self.get_varint()?;
        if length == -1 {
            return Ok(None);
        }
        let Ok(length) = usize::try_from(length) else {
            return Err(ProtocolError::InvalidLength {
                offset,
                length: i64::from(length),
            });
        };
        self.get_bytes(length).map(Some)
    }

    /// Reads 16 raw bytes as a UUID.
    ///
    /// # Errors
    /// Returns `Truncated` if fewer than 16 bytes remain.
    pub fn get_uuid(&mut self) -> ProtocolResult<Uuid> {
        Ok(Uuid::from_bytes(self.take_array()?))
    }

    /// Reads a compact array of `i32`.
    ///
    /// # Errors
    /// Propagates any element or length decode failure.
    pub fn get_compact_i32_array(&mut self) -> ProtocolResult<Vec<i32>> {
        let count = self.get_compact_array_count()?;
        (0..count).map(|_| self.get_i32()).collect()
    }

    /// Reads a compact array of UUIDs.
    ///
    /// # Errors
    /// Propagates any element or length decode failure.
    pub fn get_compact_uuid_array(&mut self) -> ProtocolResult<Vec<Uuid>> {
        let count = self.get_compact_array_count()?;
        (0..count).map(|_| self.get_uuid()).collect()
    }
}

#[allow(clippy::cast_possible_wrap)] // Zig-zag reinterprets the bit pattern.
const fn zigzag_decode_i32(raw: u32) -> i32 {
    ((raw >> 1) as i32) ^ -((raw & 1) as i32)
}

#[allow(clippy::cast_possible_wrap)] // Zig-zag reinterprets the bit pattern.
const fn zigzag_decode_i64(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    fn decoder(bytes: &[u8]) -> Decoder {
        Decoder::new(Bytes::copy_from_slice(bytes))
    }

    #[test]
    fn test_fixed_width_big_endian() {
        let mut dec = decoder(&[
            0xff, 0x01, 0x02, 0x00, 0x00, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00,
        ]);
        assert_eq!(dec.get_i8().unwrap(), -1);
        assert_eq!(dec.get_i16().unwrap(), 0x0102);
        assert_eq!(dec.get_i32().unwrap(), 42);
        assert_eq!(dec.get_i64().unwrap(), 256);
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_position_advances_by_width() {
        let mut dec = decoder(&[0; 15]);
        dec.get_i8().unwrap();
        assert_eq!(dec.position(), 1);
        dec.get_i16().unwrap();
        assert_eq!(dec.position(), 3);
        dec.get_i32().unwrap();
        assert_eq!(dec.position(), 7);
        dec.get_i64().unwrap();
        assert_eq!(dec.position(), 15);
    }

    #[test]
    fn test_uvarint_boundaries() {
        for value in [0_u32, 1, 127, 128, 300, 16_384, 2_147_483_647, u32::MAX] {
            let mut enc = Encoder::new();
            enc.put_uvarint(value);
            let mut dec = Decoder::new(enc.into_bytes());
            assert_eq!(dec.get_uvarint().unwrap(), value);
            assert!(dec.is_exhausted());
        }
    }

    #[test]
    fn test_signed_varint_boundaries() {
        for value in [0, 1, -1, 63, -64, 64, -65, i32::MAX, i32::MIN] {
            let mut enc = Encoder::new();
            enc.put_varint(value);
            let mut dec = Decoder::new(enc.into_bytes());
            assert_eq!(dec.get_varint().unwrap(), value);
        }
        for value in [0_i64, -1, 1_700_000_000_000, i64::MAX, i64::MIN] {
            let mut enc = Encoder::new();
            enc.put_varlong(value);
            let mut dec = Decoder::new(enc.into_bytes());
            assert_eq!(dec.get_varlong().unwrap(), value);
        }
    }

    #[test]
    fn test_zigzag_known_vectors() {
        let vectors: &[(i32, &[u8])] = &[
            (0, &[0x00]),
            (-1, &[0x01]),
            (1, &[0x02]),
            (-64, &[0x7f]),
            (64, &[0x80, 0x01]),
        ];
        for (value, bytes) in vectors {
            assert_eq!(decoder(bytes).get_varint().unwrap(), *value);
        }
    }

    #[test]
    fn test_truncated_varint() {
        let err = decoder(&[0x80, 0x80]).get_uvarint().unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_overlong_varint() {
        let err = decoder(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01])
            .get_uvarint()
            .unwrap_err();
        assert_eq!(err, ProtocolError::VarintTooLong { offset: 0 });
    }

    #[test]
    fn test_compact_array_len_null() {
        assert_eq!(decoder(&[0x00]).get_compact_array_len().unwrap(), -1);
        assert_eq!(decoder(&[0x00]).get_compact_array_count().unwrap(), 0);
        assert_eq!(decoder(&[0x04]).get_compact_array_len().unwrap(), 3);
    }

    #[test]
    fn test_compact_string() {
        let mut dec = decoder(&[0x04, b'f', b'o', b'o', 0x01]);
        assert_eq!(dec.get_compact_string().unwrap(), "foo");
        assert_eq!(dec.get_compact_string().unwrap(), "");
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_compact_string_null_rejected() {
        let err = decoder(&[0x00]).get_compact_string().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidCompactLength { offset: 0, raw: 0 });
    }

    #[test]
    fn test_compact_string_invalid_utf8() {
        let err = decoder(&[0x02, 0xff]).get_compact_string().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidString { offset: 1 });
    }

    #[test]
    fn test_nullable_string() {
        let mut dec = decoder(&[0xff, 0xff, 0x00, 0x02, b'i', b'd']);
        assert_eq!(dec.get_string().unwrap(), None);
        assert_eq!(dec.get_string().unwrap().as_deref(), Some("id"));
    }

    #[test]
    fn test_empty_tagged_fields() {
        let mut dec = decoder(&[0x00]);
        dec.get_empty_tagged_fields().unwrap();
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_non_empty_tagged_fields_is_fatal() {
        let err = decoder(&[0x01, 0x00, 0x01, 0xaa])
            .get_empty_tagged_fields()
            .unwrap_err();
        assert_eq!(err, ProtocolError::NonEmptyTaggedFields { offset: 0, count: 1 });
    }

    #[test]
    fn test_get_bytes_is_a_view() {
        let buf = Bytes::from_static(b"abcdef");
        let mut dec = Decoder::new(buf.clone());
        dec.get_i8().unwrap();
        let view = dec.get_bytes(3).unwrap();
        assert_eq!(&view[..], b"bcd");
        assert_eq!(view.as_ptr(), buf[1..].as_ptr());
        assert_eq!(dec.remaining(), 2);
    }

    #[test]
    fn test_get_bytes_past_end() {
        let err = decoder(b"ab").get_bytes(3).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Truncated {
                offset: 0,
                needed: 3,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_uuid_and_arrays() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let mut enc = Encoder::new();
        enc.put_uuid(&id);
        enc.put_compact_i32_array(&[1, 2, 3]);
        enc.put_compact_array_len(1);
        enc.put_uuid(&id);
        let mut dec = Decoder::new(enc.into_bytes());
        assert_eq!(dec.get_uuid().unwrap(), id);
        assert_eq!(dec.get_compact_i32_array().unwrap(), vec![1, 2, 3]);
        assert_eq!(dec.get_compact_uuid_array().unwrap(), vec![id]);
    }

    #[test]
    fn test_varint_nullable_bytes() {
        let mut dec = decoder(&[0x01, 0x04, b'h', b'i']);
        assert_eq!(dec.get_varint_nullable_bytes().unwrap(), None);
        assert_eq!(
            dec.get_varint_nullable_bytes().unwrap(),
            Some(Bytes::from_static(b"hi"))
        );

        let err = decoder(&[0x03]).get_varint_nullable_bytes().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidLength { offset: 0, length: -2 });
    }
}
