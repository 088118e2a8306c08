//! Typed request and response bodies, one module per API.

pub mod api_versions;
pub mod describe_topic_partitions;
pub mod fetch;

use bytes::Bytes;

pub use api_versions::{ApiVersion, ApiVersionsResponse};
pub use describe_topic_partitions::{
    Cursor, DescribeTopicPartitionsRequest, DescribeTopicPartitionsResponse, DescribedPartition,
    DescribedTopic,
};
pub use fetch::{
    AbortedTransaction, FetchPartition, FetchPartitionData, FetchRequest, FetchResponse,
    FetchTopic, FetchableTopicResponse, ForgottenTopic,
};

use crate::encoder::Encoder;
use crate::header::{ResponseHeader, ResponseHeaderVersion};

/// A response body for one of the supported APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ApiVersions(ApiVersionsResponse),
    DescribeTopicPartitions(DescribeTopicPartitionsResponse),
    Fetch(FetchResponse),
}

impl Response {
    /// Header layout that precedes this body.
    ///
    /// `ApiVersions` keeps header v0 so that clients can parse it before
    /// knowing which versions the broker speaks.
    #[must_use]
    pub const fn header_version(&self) -> ResponseHeaderVersion {
        match self {
            Self::ApiVersions(_) => ResponseHeaderVersion::V0,
            Self::DescribeTopicPartitions(_) | Self::Fetch(_) => ResponseHeaderVersion::V1,
        }
    }

    /// Encodes header and body into a length-prefixed frame.
    #[must_use]
    pub fn encode_framed(&self, correlation_id: i32) -> Bytes {
        let mut enc = Encoder::new();
        ResponseHeader::new(correlation_id).encode(&mut enc, self.header_version());
        match self {
            Self::ApiVersions(body) => body.encode(&mut enc),
            Self::DescribeTopicPartitions(body) => body.encode(&mut enc),
            Self::Fetch(body) => body.encode(&mut enc),
        }
        enc.into_framed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorCode;

    #[test]
    fn test_api_versions_error_frame() {
        let response = Response::ApiVersions(ApiVersionsResponse::error(
            ErrorCode::UnsupportedVersion,
        ));
        let frame = response.encode_framed(0x1234_5678);
        assert_eq!(&frame[..], &[0, 0, 0, 6, 0x12, 0x34, 0x56, 0x78, 0x00, 0x23]);
    }

    #[test]
    fn test_describe_frame_uses_header_v1() {
        let response = Response::DescribeTopicPartitions(DescribeTopicPartitionsResponse::default());
        let frame = response.encode_framed(7);
        assert_eq!(
            &frame[..],
            &[0, 0, 0, 12, 0, 0, 0, 7, 0x00, 0, 0, 0, 0, 0x01, 0xff, 0x00]
        );
    }
}
