//! `Fetch` (key 1) request and response, v16 layout.

use uuid::Uuid;

use crate::api::ErrorCode;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;
use crate::record::RecordBatch;

/// A partition the client wants records from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchPartition {
    pub partition: i32,
    pub current_leader_epoch: i32,
    pub fetch_offset: i64,
    pub last_fetched_epoch: i32,
    pub log_start_offset: i64,
    pub partition_max_bytes: i32,
}

impl FetchPartition {
    fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let partition = dec.get_i32()?;
        let current_leader_epoch = dec.get_i32()?;
        let fetch_offset = dec.get_i64()?;
        let last_fetched_epoch = dec.get_i32()?;
        let log_start_offset = dec.get_i64()?;
        let partition_max_bytes = dec.get_i32()?;
        dec.get_empty_tagged_fields()?;
        Ok(Self {
            partition,
            current_leader_epoch,
            fetch_offset,
            last_fetched_epoch,
            log_start_offset,
            partition_max_bytes,
        })
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.partition);
        enc.put_i32(self.current_leader_epoch);
        enc.put_i64(self.fetch_offset);
        enc.put_i32(self.last_fetched_epoch);
        enc.put_i64(self.log_start_offset);
        enc.put_i32(self.partition_max_bytes);
        enc.put_empty_tagged_fields();
    }
}

/// A topic the client wants records from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<FetchPartition>,
}

impl FetchTopic {
    /// Fetch from offset 0 of each listed partition.
    #[must_use]
    pub fn new(topic_id: Uuid, partitions: &[i32]) -> Self {
        Self {
            topic_id,
            partitions: partitions
                .iter()
                .map(|&partition| FetchPartition {
                    partition,
                    ..FetchPartition::default()
                })
                .collect(),
        }
    }

    fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let topic_id = dec.get_uuid()?;
        let count = dec.get_compact_array_count()?;
        let partitions = (0..count)
            .map(|_| FetchPartition::decode(dec))
            .collect::<ProtocolResult<Vec<_>>>()?;
        dec.get_empty_tagged_fields()?;
        Ok(Self {
            topic_id,
            partitions,
        })
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_uuid(&self.topic_id);
        enc.put_compact_array_len(self.partitions.len());
        for partition in &self.partitions {
            partition.encode(enc);
        }
        enc.put_empty_tagged_fields();
    }
}

/// Partitions to drop from an incremental fetch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgottenTopic {
    pub topic_id: Uuid,
    pub partitions: Vec<i32>,
}

impl ForgottenTopic {
    fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let topic_id = dec.get_uuid()?;
        let partitions = dec.get_compact_i32_array()?;
        dec.get_empty_tagged_fields()?;
        Ok(Self {
            topic_id,
            partitions,
        })
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_uuid(&self.topic_id);
        enc.put_compact_i32_array(&self.partitions);
        enc.put_empty_tagged_fields();
    }
}

/// `Fetch` request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchRequest {
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub max_bytes: i32,
    pub isolation_level: i8,
    pub session_id: i32,
    pub session_epoch: i32,
    pub topics: Vec<FetchTopic>,
    pub forgotten_topics_data: Vec<ForgottenTopic>,
    pub rack_id: String,
}

impl FetchRequest {
    /// Decodes a v16 body.
    ///
    /// # Errors
    /// Returns an error if any field is malformed or a tagged-field block is
    /// not empty.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let max_wait_ms = dec.get_i32()?;
        let min_bytes = dec.get_i32()?;
        let max_bytes = dec.get_i32()?;
        let isolation_level = dec.get_i8()?;
        let session_id = dec.get_i32()?;
        let session_epoch = dec.get_i32()?;

        let count = dec.get_compact_array_count()?;
        let topics = (0..count)
            .map(|_| FetchTopic::decode(dec))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let count = dec.get_compact_array_count()?;
        let forgotten_topics_data = (0..count)
            .map(|_| ForgottenTopic::decode(dec))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let rack_id = dec.get_compact_string()?;
        dec.get_empty_tagged_fields()?;

        Ok(Self {
            max_wait_ms,
            min_bytes,
            max_bytes,
            isolation_level,
            session_id,
            session_epoch,
            topics,
            forgotten_topics_data,
            rack_id,
        })
    }

    /// Encodes a v16 body.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.max_wait_ms);
        enc.put_i32(self.min_bytes);
        enc.put_i32(self.max_bytes);
        enc.put_i8(self.isolation_level);
        enc.put_i32(self.session_id);
        enc.put_i32(self.session_epoch);
        enc.put_compact_array_len(self.topics.len());
        for topic in &self.topics {
            topic.encode(enc);
        }
        enc.put_compact_array_len(self.forgotten_topics_data.len());
        for forgotten in &self.forgotten_topics_data {
            forgotten.encode(enc);
        }
        enc.put_compact_string(&self.rack_id);
        enc.put_empty_tagged_fields();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortedTransaction {
    pub producer_id: i64,
    pub first_offset: i64,
}

/// Records and offsets returned for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPartitionData {
    pub partition_index: i32,
    pub error_code: ErrorCode,
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,
    pub aborted_transactions: Vec<AbortedTransaction>,
    pub preferred_read_replica: i32,
    /// Batches re-encoded verbatim as the `records` field.
    pub records: Vec<RecordBatch>,
}

impl FetchPartitionData {
    /// Partition data with zeroed offsets and no records.
    #[must_use]
    pub const fn empty(partition_index: i32, error_code: ErrorCode) -> Self {
        Self {
            partition_index,
            error_code,
            high_watermark: 0,
            last_stable_offset: 0,
            log_start_offset: 0,
            aborted_transactions: Vec::new(),
            preferred_read_replica: 0,
            records: Vec::new(),
        }
    }

    /// Partition data carrying `records`.
    #[must_use]
    pub fn with_records(partition_index: i32, records: Vec<RecordBatch>) -> Self {
        Self {
            records,
            ..Self::empty(partition_index, ErrorCode::None)
        }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.partition_index);
        enc.put_i16(self.error_code.as_i16());
        enc.put_i64(self.high_watermark);
        enc.put_i64(self.last_stable_offset);
        enc.put_i64(self.log_start_offset);
        enc.put_compact_array_len(self.aborted_transactions.len());
        for txn in &self.aborted_transactions {
            enc.put_i64(txn.producer_id);
            enc.put_i64(txn.first_offset);
            enc.put_empty_tagged_fields();
        }
        enc.put_i32(self.preferred_read_replica);
        enc.put_compact_records(&RecordBatch::encode_all(&self.records));
        enc.put_empty_tagged_fields();
    }
}

/// Per-topic part of a fetch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchableTopicResponse {
    pub topic_id: Uuid,
    pub partitions: Vec<FetchPartitionData>,
}

impl FetchableTopicResponse {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_uuid(&self.topic_id);
        enc.put_compact_array_len(self.partitions.len());
        for partition in &self.partitions {
            partition.encode(enc);
        }
        enc.put_empty_tagged_fields();
    }
}

/// `Fetch` response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    pub session_id: i32,
    pub responses: Vec<FetchableTopicResponse>,
}

impl FetchResponse {
    /// Successful response over `responses`.
    #[must_use]
    pub const fn new(responses: Vec<FetchableTopicResponse>) -> Self {
        Self {
            throttle_time_ms: 0,
            error_code: ErrorCode::None,
            session_id: 0,
            responses,
        }
    }

    /// Top-level error with no topics.
    #[must_use]
    pub const fn error(error_code: ErrorCode) -> Self {
        Self {
            throttle_time_ms: 0,
            error_code,
            session_id: 0,
            responses: Vec::new(),
        }
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.throttle_time_ms);
        enc.put_i16(self.error_code.as_i16());
        enc.put_i32(self.session_id);
        enc.put_compact_array_len(self.responses.len());
        for response in &self.responses {
            response.encode(enc);
        }
        enc.put_empty_tagged_fields();
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::record::Record;

    const TOPIC_ID: Uuid = Uuid::from_u128(0x71a5_9a51_8968_411f_9e8b_7b7f_7e5b_9d8c);

    #[test]
    fn test_request_roundtrip() {
        let request = FetchRequest {
            max_wait_ms: 500,
            min_bytes: 1,
            max_bytes: 52_428_800,
            session_epoch: -1,
            topics: vec![FetchTopic::new(TOPIC_ID, &[0, 1])],
            forgotten_topics_data: vec![ForgottenTopic {
                topic_id: Uuid::from_u128(9),
                partitions: vec![4],
            }],
            rack_id: "rack-a".to_string(),
            ..FetchRequest::default()
        };
        let mut enc = Encoder::new();
        request.encode(&mut enc);

        let mut dec = Decoder::new(enc.into_bytes());
        assert_eq!(FetchRequest::decode(&mut dec).unwrap(), request);
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_request_truncated() {
        let mut enc = Encoder::new();
        FetchRequest {
            topics: vec![FetchTopic::new(TOPIC_ID, &[0])],
            ..FetchRequest::default()
        }
        .encode(&mut enc);
        let bytes = enc.into_bytes();

        let err = FetchRequest::decode(&mut Decoder::new(bytes.slice(..bytes.len() - 2)));
        assert!(err.unwrap_err().is_truncation());
    }

    #[test]
    fn test_unknown_topic_partition_bytes() {
        let response = FetchResponse::new(vec![FetchableTopicResponse {
            topic_id: TOPIC_ID,
            partitions: vec![FetchPartitionData::empty(0, ErrorCode::UnknownTopic)],
        }]);
        let mut enc = Encoder::new();
        response.encode(&mut enc);

        let mut expected = vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02];
        expected.extend_from_slice(TOPIC_ID.as_bytes());
        expected.push(0x02);
        expected.extend_from_slice(&[0, 0, 0, 0, 0x00, 0x64]);
        expected.extend_from_slice(&[0; 24]);
        expected.extend_from_slice(&[0x01, 0, 0, 0, 0, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(enc.as_bytes(), &expected[..]);
    }

    #[test]
    fn test_records_are_length_prefixed_batches() {
        let batch = RecordBatch::new(
            0,
            vec![Record::new(0, None, Some(Bytes::from_static(b"Hello")))],
        );
        let data = FetchPartitionData::with_records(0, vec![batch.clone()]);
        let mut enc = Encoder::new();
        data.encode(&mut enc);
        let bytes = enc.into_bytes();

        // index, error, three offsets, aborted txns, preferred replica
        let mut dec = Decoder::new(bytes);
        dec.get_bytes(4 + 2 + 24 + 1 + 4).unwrap();
        let len = dec.get_compact_array_len().unwrap();
        assert_eq!(usize::try_from(len).unwrap(), batch.encoded_len());
        let records = dec.get_bytes(batch.encoded_len()).unwrap();
        assert_eq!(RecordBatch::decode_all(records).unwrap(), vec![batch]);
        dec.get_empty_tagged_fields().unwrap();
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_error_response_has_no_topics() {
        let mut enc = Encoder::new();
        FetchResponse::error(ErrorCode::UnsupportedVersion).encode(&mut enc);
        assert_eq!(enc.as_bytes(), &[0, 0, 0, 0, 0x00, 0x23, 0, 0, 0, 0, 0x01, 0x00]);
    }
}
