//! Error types for the wire codec.
//!
//! Every decode failure is fatal for the request being decoded: once a field is
//! malformed the framing of everything after it cannot be trusted.

use thiserror::Error;

/// Result type for codec operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A read would go past the end of the buffer.
    #[error("input is truncated: need {needed} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        /// Cursor offset where the read started.
        offset: usize,
        /// Bytes the read needed.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// An unsigned varint ran past 5 bytes.
    #[error("varint overflow at offset {offset} (more than 5 bytes)")]
    VarintTooLong {
        /// Cursor offset where the varint started.
        offset: usize,
    },

    /// A varlong ran past 10 bytes.
    #[error("varlong overflow at offset {offset} (more than 10 bytes)")]
    VarlongTooLong {
        /// Cursor offset where the varlong started.
        offset: usize,
    },

    /// A tagged-field block carried tags. Only empty blocks are supported.
    #[error("expected empty tagged field block at offset {offset}, found {count} tags")]
    NonEmptyTaggedFields {
        /// Cursor offset of the tag count.
        offset: usize,
        /// Number of tags announced.
        count: u32,
    },

    /// String bytes were not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidString {
        /// Cursor offset of the string payload.
        offset: usize,
    },

    /// A compact length was null where a value is required.
    #[error("invalid compact length {raw} at offset {offset}")]
    InvalidCompactLength {
        /// Cursor offset of the length.
        offset: usize,
        /// Raw varint value on the wire.
        raw: u32,
    },

    /// A length prefix was negative (other than the -1 null marker) or too large.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength {
        /// Cursor offset of the length.
        offset: usize,
        /// The decoded length.
        length: i64,
    },

    /// A record batch declared a negative record count.
    #[error("invalid records count {count} in batch at offset {offset}")]
    InvalidRecordsCount {
        /// Offset of the batch.
        offset: usize,
        /// The declared count.
        count: i32,
    },

    /// A record batch did not consume exactly its declared length.
    #[error("record batch at offset {offset} declared {declared} bytes but consumed {consumed}")]
    BatchLengthMismatch {
        /// Offset of the batch.
        offset: usize,
        /// `batch_length` from the header.
        declared: i32,
        /// Bytes actually consumed after the length field.
        consumed: usize,
    },

    /// A record did not consume exactly its declared length.
    #[error("record at offset {offset} declared {declared} bytes but consumed {consumed}")]
    RecordLengthMismatch {
        /// Offset of the record body.
        offset: usize,
        /// Length from the record prefix.
        declared: i32,
        /// Bytes actually consumed.
        consumed: usize,
    },
}

impl ProtocolError {
    /// Returns true if the error comes from running out of input.
    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::Truncated {
            offset: 12,
            needed: 4,
            remaining: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("offset 12"));
        assert!(msg.contains("need 4"));
        assert!(err.is_truncation());
    }

    #[test]
    fn test_tagged_fields_display() {
        let err = ProtocolError::NonEmptyTaggedFields { offset: 3, count: 2 };
        assert_eq!(
            format!("{err}"),
            "expected empty tagged field block at offset 3, found 2 tags"
        );
        assert!(!err.is_truncation());
    }
}
