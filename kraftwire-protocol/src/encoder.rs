//! Write side of the binary cursor.
//!
//! Mirrors every read in [`crate::decoder`]. Writes go into a growable
//! [`BytesMut`], so encoding cannot fail; lengths are bounded by the frame
//! size limit long before they could overflow a `u32`.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// Size of the outer length prefix on every response frame.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Cursor that accumulates an encoded response body.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn put_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// Writes an unsigned base-128 varint.
    #[allow(clippy::cast_possible_truncation)] // Masked to 7 bits.
    pub fn put_uvarint(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.put_u8(((value & 0x7f) as u8) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    /// Writes an unsigned base-128 varlong.
    #[allow(clippy::cast_possible_truncation)] // Masked to 7 bits.
    pub fn put_uvarlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8(((value & 0x7f) as u8) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    /// Writes a zig-zag encoded signed varint.
    #[allow(clippy::cast_sign_loss)] // Zig-zag reinterprets the bit pattern.
    pub fn put_varint(&mut self, value: i32) {
        self.put_uvarint(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Writes a zig-zag encoded signed varlong.
    #[allow(clippy::cast_sign_loss)] // Zig-zag reinterprets the bit pattern.
    pub fn put_varlong(&mut self, value: i64) {
        self.put_uvarlong(((value << 1) ^ (value >> 63)) as u64);
    }

    /// Writes a compact array length (`len + 1`).
    #[allow(clippy::cast_possible_truncation)] // Bounded by the frame size limit.
    pub fn put_compact_array_len(&mut self, len: usize) {
        self.put_uvarint(len as u32 + 1);
    }

    /// Writes a compact UTF-8 string.
    pub fn put_compact_string(&mut self, value: &str) {
        self.put_compact_array_len(value.len());
        self.buf.put_slice(value.as_bytes());
    }

    /// Writes a classic nullable string with an `i16` length prefix.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn put_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.buf.put_i16(s.len() as i16);
                self.buf.put_slice(s.as_bytes());
            }
            None => self.buf.put_i16(-1),
        }
    }

    /// Writes an empty tagged-field block.
    pub fn put_empty_tagged_fields(&mut self) {
        self.put_uvarint(0);
    }

    pub fn put_raw_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Writes bytes with a zig-zag varint length prefix; `None` writes -1.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn put_varint_nullable_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(b) => {
                self.put_varint(b.len() as i32);
                self.buf.put_slice(b);
            }
            None => self.put_varint(-1),
        }
    }

    pub fn put_uuid(&mut self, id: &Uuid) {
        self.buf.put_slice(id.as_bytes());
    }

    pub fn put_compact_i32_array(&mut self, values: &[i32]) {
        self.put_compact_array_len(values.len());
        for &value in values {
            self.buf.put_i32(value);
        }
    }

    pub fn put_compact_uuid_array(&mut self, values: &[Uuid]) {
        self.put_compact_array_len(values.len());
        for id in values {
            self.put_uuid(id);
        }
    }

    /// Writes a compact records field: a length-plus-one varint followed by
    /// the raw record batch bytes.
    pub fn put_compact_records(&mut self, records: &[u8]) {
        self.put_compact_array_len(records.len());
        self.buf.put_slice(records);
    }

    /// Returns the encoded bytes without a length prefix.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Returns the encoded bytes behind a 4-byte big-endian length prefix.
    ///
    /// This is the only place the outer frame length is produced.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Bounded by the frame size limit.
    pub fn into_framed(self) -> Bytes {
        let mut out = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.buf.len());
        out.put_u32(self.buf.len() as u32);
        out.put_slice(&self.buf);
        out.freeze()
    }
}
