//! Record batches (magic v2).
//!
//! The same layout is used on the wire in fetch responses and on disk in the
//! KRaft log segments.
//!
//! ```text
//! ┌─────────────┬──────────────┬──────────────────────────────────────────┐
//! │ base_offset │ batch_length │ leader_epoch magic crc attributes ...    │
//! │    int64    │    int32     │ ... base_sequence records_count records  │
//! └─────────────┴──────────────┴──────────────────────────────────────────┘
//!                               └───────────── batch_length bytes ───────┘
//! ```
//!
//! Each record is prefixed by its body length as a zig-zag varint:
//!
//! ```text
//! length attributes timestamp_delta offset_delta key value headers
//! varint   int8       varlong        varint     (varint len + bytes)...
//! ```
//!
//! Keys and values use a length of -1 for null.

use bytes::Bytes;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{ProtocolError, ProtocolResult};

/// Current record batch format.
pub const CURRENT_RECORD_BATCH_MAGIC: i8 = 2;

/// Bytes in front of the region covered by `batch_length`.
pub const RECORD_BATCH_LOG_OVERHEAD: usize = 12;

/// Bytes from `partition_leader_epoch` through `records_count`.
pub const RECORD_BATCH_BODY_HEADER_LEN: usize = 49;

/// A record header (key-value metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Header key.
    pub key: String,
    /// Header value; `None` when null on the wire.
    pub value: Option<Bytes>,
}

impl RecordHeader {
    /// Decodes a header.
    ///
    /// # Errors
    /// Returns an error if the key is null, not UTF-8, or the buffer is short.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let offset = dec.position();
        let key = dec
            .get_varint_nullable_bytes()?
            .ok_or(ProtocolError::InvalidLength { offset, length: -1 })?;
        let key = String::from_utf8(key.to_vec())
            .map_err(|_| ProtocolError::InvalidString { offset })?;
        let value = dec.get_varint_nullable_bytes()?;
        Ok(Self { key, value })
    }

    /// Encodes the header.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_varint_nullable_bytes(Some(self.key.as_bytes()));
        enc.put_varint_nullable_bytes(self.value.as_deref());
    }
}

/// A single record inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Length of the record body following the length prefix.
    pub length: i32,
    /// Record attributes (unused by the v2 format, always 0).
    pub attributes: i8,
    /// Timestamp relative to the batch's first timestamp.
    pub timestamp_delta: i64,
    /// Offset relative to the batch's base offset.
    pub offset_delta: i32,
    /// Record key.
    pub key: Option<Bytes>,
    /// Record value.
    pub value: Option<Bytes>,
    /// Record headers.
    pub headers: Vec<RecordHeader>,
}

impl Record {
    /// Creates a record and computes its length prefix.
    #[must_use]
    pub fn new(offset_delta: i32, key: Option<Bytes>, value: Option<Bytes>) -> Self {
        let mut record = Self {
            length: 0,
            attributes: 0,
            timestamp_delta: 0,
            offset_delta,
            key,
            value,
            headers: Vec::new(),
        };
        record.length = record.body_len();
        record
    }

    /// Adds a header, keeping the length prefix in sync.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: Option<Bytes>) -> Self {
        self.headers.push(RecordHeader {
            key: key.into(),
            value,
        });
        self.length = self.body_len();
        self
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Bounded by batch size.
    fn body_len(&self) -> i32 {
        let mut enc = Encoder::new();
        self.encode_body(&mut enc);
        enc.len() as i32
    }

    /// Decodes a record and checks the body spans exactly `length` bytes.
    ///
    /// # Errors
    /// Returns an error if any field is malformed or the length disagrees
    /// with the bytes consumed.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let length = dec.get_varint()?;
        let start = dec.position();

        let attributes = dec.get_i8()?;
        let timestamp_delta = dec.get_varlong()?;
        let offset_delta = dec.get_varint()?;
        let key = dec.get_varint_nullable_bytes()?;
        let value = dec.get_varint_nullable_bytes()?;

        let header_offset = dec.position();
        let header_count = dec.get_varint()?;
        let header_count =
            usize::try_from(header_count).map_err(|_| ProtocolError::InvalidLength {
                offset: header_offset,
                length: i64::from(header_count),
            })?;
        let headers = (0..header_count)
            .map(|_| RecordHeader::decode(dec))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let consumed = dec.position() - start;
        if usize::try_from(length).ok() != Some(consumed) {
            return Err(ProtocolError::RecordLengthMismatch {
                offset: start,
                declared: length,
                consumed,
            });
        }

        Ok(Self {
            length,
            attributes,
            timestamp_delta,
            offset_delta,
            key,
            value,
            headers,
        })
    }

    /// Encodes the record, length prefix included.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_varint(self.length);
        self.encode_body(enc);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn encode_body(&self, enc: &mut Encoder) {
        enc.put_i8(self.attributes);
        enc.put_varlong(self.timestamp_delta);
        enc.put_varint(self.offset_delta);
        enc.put_varint_nullable_bytes(self.key.as_deref());
        enc.put_varint_nullable_bytes(self.value.as_deref());
        enc.put_varint(self.headers.len() as i32);
        for header in &self.headers {
            header.encode(enc);
        }
    }
}

/// A batch of records with its v2 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBatch {
    /// Offset of the first record.
    pub base_offset: i64,
    /// Bytes following this field, through the end of the last record.
    pub batch_length: i32,
    /// Leader epoch when the batch was appended.
    pub partition_leader_epoch: i32,
    /// Format version.
    pub magic: i8,
    /// CRC-32C over attributes through the end of the batch, kept verbatim.
    pub crc: i32,
    /// Compression, timestamp type, transactional and control flags.
    pub attributes: i16,
    /// Offset delta of the last record.
    pub last_offset_delta: i32,
    /// Timestamp of the first record.
    pub first_timestamp: i64,
    /// Largest timestamp in the batch.
    pub max_timestamp: i64,
    /// Producer id, -1 when not idempotent.
    pub producer_id: i64,
    /// Producer epoch, -1 when not idempotent.
    pub producer_epoch: i16,
    /// Sequence of the first record, -1 when not idempotent.
    pub base_sequence: i32,
    /// Records in offset order.
    pub records: Vec<Record>,
}

impl RecordBatch {
    /// Builds an uncompressed, non-transactional batch around `records`.
    ///
    /// `batch_length` and `last_offset_delta` are derived from the records.
    /// The CRC is left at zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Bounded by batch size.
    pub fn new(base_offset: i64, records: Vec<Record>) -> Self {
        let mut enc = Encoder::new();
        for record in &records {
            record.encode(&mut enc);
        }
        let last_offset_delta = records.iter().map(|r| r.offset_delta).max().unwrap_or(0);
        Self {
            base_offset,
            batch_length: (RECORD_BATCH_BODY_HEADER_LEN + enc.len()) as i32,
            partition_leader_epoch: 0,
            magic: CURRENT_RECORD_BATCH_MAGIC,
            crc: 0,
            attributes: 0,
            last_offset_delta,
            first_timestamp: 0,
            max_timestamp: 0,
            producer_id: -1,
            producer_epoch: -1,
            base_sequence: -1,
            records,
        }
    }

    /// Total bytes this batch occupies in a log or on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        RECORD_BATCH_LOG_OVERHEAD + usize::try_from(self.batch_length).unwrap_or(0)
    }

    /// Decodes one batch.
    ///
    /// The decoder advances by exactly `12 + batch_length` bytes on success.
    ///
    /// # Errors
    /// Returns an error on truncation, a negative record count, a malformed
    /// record, or when the records do not fill `batch_length` exactly.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let offset = dec.position();
        let base_offset = dec.get_i64()?;
        let batch_length = dec.get_i32()?;
        let body_start = dec.position();

        let partition_leader_epoch = dec.get_i32()?;
        let magic = dec.get_i8()?;
        let crc = dec.get_i32()?;
        let attributes = dec.get_i16()?;
        let last_offset_delta = dec.get_i32()?;
        let first_timestamp = dec.get_i64()?;
        let max_timestamp = dec.get_i64()?;
        let producer_id = dec.get_i64()?;
        let producer_epoch = dec.get_i16()?;
        let base_sequence = dec.get_i32()?;

        let records_count = dec.get_i32()?;
        let count = usize::try_from(records_count).map_err(|_| {
            ProtocolError::InvalidRecordsCount {
                offset,
                count: records_count,
            }
        })?;
        let records = (0..count)
            .map(|_| Record::decode(dec))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let consumed = dec.position() - body_start;
        if usize::try_from(batch_length).ok() != Some(consumed) {
            return Err(ProtocolError::BatchLengthMismatch {
                offset,
                declared: batch_length,
                consumed,
            });
        }

        Ok(Self {
            base_offset,
            batch_length,
            partition_leader_epoch,
            magic,
            crc,
            attributes,
            last_offset_delta,
            first_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records,
        })
    }

    /// Decodes consecutive batches until the buffer is exhausted.
    ///
    /// # Errors
    /// Returns the first batch decode failure.
    pub fn decode_all(buf: impl Into<Bytes>) -> ProtocolResult<Vec<Self>> {
        let mut dec = Decoder::new(buf);
        let mut batches = Vec::new();
        while !dec.is_exhausted() {
            batches.push(Self::decode(&mut dec)?);
        }
        Ok(batches)
    }

    /// Encodes the batch. Header fields, CRC included, are written verbatim.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Bounded by batch size.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i64(self.base_offset);
        enc.put_i32(self.batch_length);
        enc.put_i32(self.partition_leader_epoch);
        enc.put_i8(self.magic);
        enc.put_i32(self.crc);
        enc.put_i16(self.attributes);
        enc.put_i32(self.last_offset_delta);
        enc.put_i64(self.first_timestamp);
        enc.put_i64(self.max_timestamp);
        enc.put_i64(self.producer_id);
        enc.put_i16(self.producer_epoch);
        enc.put_i32(self.base_sequence);
        enc.put_i32(self.records.len() as i32);
        for record in &self.records {
            record.encode(enc);
        }
    }

    /// Encodes a sequence of batches back to back.
    #[must_use]
    pub fn encode_all(batches: &[Self]) -> Bytes {
        let capacity = batches.iter().map(Self::encoded_len).sum();
        let mut enc = Encoder::with_capacity(capacity);
        for batch in batches {
            batch.encode(&mut enc);
        }
        enc.into_bytes()
    }
}
