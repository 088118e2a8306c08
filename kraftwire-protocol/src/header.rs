//! Request and response headers.
//!
//! ```text
//! Request header v2:
//! ┌──────────┬─────────────┬────────────────┬───────────────┬──────────┐
//! │ api_key  │ api_version │ correlation_id │   client_id   │ tag buf  │
//! │  int16   │    int16    │     int32      │ int16 + bytes │ uvarint  │
//! └──────────┴─────────────┴────────────────┴───────────────┴──────────┘
//!
//! Response header v0: correlation_id (int32)
//! Response header v1: correlation_id (int32) + empty tag buffer
//! ```

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;

/// Decoded request header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestHeader {
    /// Request kind.
    pub api_key: i16,
    /// Requested protocol version.
    pub api_version: i16,
    /// Echoed back in the response header.
    pub correlation_id: i32,
    /// Client identifier; null on the wire decodes to `None`.
    pub client_id: Option<String>,
}

impl RequestHeader {
    /// Decodes a v2 request header.
    ///
    /// # Errors
    /// Returns an error on truncation, bad UTF-8 in the client id, or a
    /// non-empty tagged-field block.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let api_key = dec.get_i16()?;
        let api_version = dec.get_i16()?;
        let correlation_id = dec.get_i32()?;
        let client_id = dec.get_string()?;
        dec.get_empty_tagged_fields()?;
        Ok(Self {
            api_key,
            api_version,
            correlation_id,
            client_id,
        })
    }

    /// Encodes a v2 request header.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i16(self.api_key);
        enc.put_i16(self.api_version);
        enc.put_i32(self.correlation_id);
        enc.put_string(self.client_id.as_deref());
        enc.put_empty_tagged_fields();
    }
}

/// Response header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHeaderVersion {
    /// Correlation id only.
    V0,
    /// Correlation id followed by an empty tagged-field block.
    V1,
}

/// Response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Correlation id copied from the request.
    pub correlation_id: i32,
}

impl ResponseHeader {
    /// Creates a header echoing `correlation_id`.
    #[must_use]
    pub const fn new(correlation_id: i32) -> Self {
        Self { correlation_id }
    }

    /// Encodes the header in the given layout.
    pub fn encode(&self, enc: &mut Encoder, version: ResponseHeaderVersion) {
        enc.put_i32(self.correlation_id);
        if version == ResponseHeaderVersion::V1 {
            enc.put_empty_tagged_fields();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    #[test]
    fn test_request_header_decode() {
        let bytes: &[u8] = &[
            0x00, 0x12, // api_key 18
            0x00, 0x04, // api_version 4
            0x6f, 0x7f, 0xc6, 0x61, // correlation_id
            0x00, 0x09, b'k', b'a', b'f', b'k', b'a', b'-', b'c', b'l', b'i', // client_id
            0x00, // tag buffer
        ];
        let mut dec = Decoder::new(bytes.to_vec());
        let header = RequestHeader::decode(&mut dec).unwrap();
        assert_eq!(header.api_key, 18);
        assert_eq!(header.api_version, 4);
        assert_eq!(header.correlation_id, 0x6f7f_c661);
        assert_eq!(header.client_id.as_deref(), Some("kafka-cli"));
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_request_header_tagged_fields_rejected() {
        let header = RequestHeader {
            api_key: 75,
            api_version: 0,
            correlation_id: 1,
            client_id: None,
        };
        let mut enc = Encoder::new();
        header.encode(&mut enc);
        let mut bytes = enc.as_bytes().to_vec();
        *bytes.last_mut().unwrap() = 0x02;

        let err = RequestHeader::decode(&mut Decoder::new(bytes)).unwrap_err();
        assert!(matches!(err, ProtocolError::NonEmptyTaggedFields { count: 2, .. }));
    }

    #[test]
    fn test_response_header_layouts() {
        let header = ResponseHeader::new(7);

        let mut v0 = Encoder::new();
        header.encode(&mut v0, ResponseHeaderVersion::V0);
        assert_eq!(v0.as_bytes(), &[0, 0, 0, 7]);

        let mut v1 = Encoder::new();
        header.encode(&mut v1, ResponseHeaderVersion::V1);
        assert_eq!(v1.as_bytes(), &[0, 0, 0, 7, 0]);
    }
}
