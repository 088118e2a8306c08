//! Request dispatch: header decoding, version validation, and body decoding
//! keyed by api key.

use bytes::Bytes;

use crate::api::{ApiKey, ErrorCode, SUPPORTED_REQUEST_VERSIONS};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;
use crate::header::RequestHeader;
use crate::messages::{DescribeTopicPartitionsRequest, FetchRequest};

/// Decoded request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `ApiVersions` carries nothing the broker reads.
    ApiVersions,
    DescribeTopicPartitions(DescribeTopicPartitionsRequest),
    Fetch(FetchRequest),
    /// Unrecognised api key, or a version outside the supported range.
    Unknown,
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Payload size, excluding the 4-byte length prefix.
    pub size: i32,
    pub header: RequestHeader,
    /// Request-level error detected during decoding.
    pub error: Option<ErrorCode>,
    pub body: RequestBody,
}

impl Message {
    /// Decodes a request payload (the frame without its length prefix).
    ///
    /// A version outside the supported range is not a decode fault: the
    /// message carries `UnsupportedVersion` and the body is left unread.
    ///
    /// # Errors
    /// Returns an error if the header or a body fails to decode.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Bounded by frame limit.
    pub fn decode(payload: impl Into<Bytes>) -> ProtocolResult<Self> {
        let mut dec = Decoder::new(payload);
        let size = dec.remaining() as i32;
        let header = RequestHeader::decode(&mut dec)?;

        if !SUPPORTED_REQUEST_VERSIONS.contains(header.api_version) {
            return Ok(Self {
                size,
                header,
                error: Some(ErrorCode::UnsupportedVersion),
                body: RequestBody::Unknown,
            });
        }

        let body = match ApiKey::from_i16(header.api_key) {
            Some(ApiKey::ApiVersions) => RequestBody::ApiVersions,
            Some(ApiKey::DescribeTopicPartitions) => RequestBody::DescribeTopicPartitions(
                DescribeTopicPartitionsRequest::decode(&mut dec)?,
            ),
            Some(ApiKey::Fetch) => RequestBody::Fetch(FetchRequest::decode(&mut dec)?),
            None => RequestBody::Unknown,
        };

        Ok(Self {
            size,
            header,
            error: None,
            body,
        })
    }

    /// Encodes a request frame, length prefix included.
    ///
    /// Used by clients and tests; the broker itself only decodes requests.
    #[must_use]
    pub fn encode_request(header: &RequestHeader, body: &RequestBody) -> Bytes {
        let mut enc = Encoder::new();
        header.encode(&mut enc);
        match body {
            RequestBody::DescribeTopicPartitions(request) => request.encode(&mut enc),
            RequestBody::Fetch(request) => request.encode(&mut enc),
            RequestBody::ApiVersions | RequestBody::Unknown => {}
        }
        enc.into_framed()
    }
}
