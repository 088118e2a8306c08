//! `DescribeTopicPartitions` (key 75) request and response, v0 layout.

use uuid::Uuid;

use crate::api::{ErrorCode, TOPIC_AUTHORIZED_OPERATIONS};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;

/// Wire marker of an absent cursor.
const NULL_CURSOR: i8 = -1;

/// Wire marker of a present cursor.
const PRESENT_CURSOR: i8 = 1;

/// Pagination cursor: the first partition to describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub topic_name: String,
    pub partition_index: i32,
}

impl Cursor {
    fn decode_nullable(dec: &mut Decoder) -> ProtocolResult<Option<Self>> {
        if dec.get_i8()? == NULL_CURSOR {
            return Ok(None);
        }
        let topic_name = dec.get_compact_string()?;
        let partition_index = dec.get_i32()?;
        dec.get_empty_tagged_fields()?;
        Ok(Some(Self {
            topic_name,
            partition_index,
        }))
    }

    fn encode_nullable(cursor: Option<&Self>, enc: &mut Encoder) {
        match cursor {
            None => enc.put_i8(NULL_CURSOR),
            Some(cursor) => {
                enc.put_i8(PRESENT_CURSOR);
                enc.put_compact_string(&cursor.topic_name);
                enc.put_i32(cursor.partition_index);
                enc.put_empty_tagged_fields();
            }
        }
    }
}

/// `DescribeTopicPartitions` request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeTopicPartitionsRequest {
    /// Topic names, in the order the client asked for them.
    pub topics: Vec<String>,
    pub response_partition_limit: i32,
    pub cursor: Option<Cursor>,
}

impl DescribeTopicPartitionsRequest {
    /// Request for `topics` with the default partition limit and no cursor.
    #[must_use]
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            response_partition_limit: 2000,
            cursor: None,
        }
    }

    /// Decodes a v0 body.
    ///
    /// # Errors
    /// Returns an error if any field is malformed or a tagged-field block is
    /// not empty.
    pub fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let count = dec.get_compact_array_count()?;
        let topics = (0..count)
            .map(|_| {
                let name = dec.get_compact_string()?;
                dec.get_empty_tagged_fields()?;
                Ok(name)
            })
            .collect::<ProtocolResult<Vec<_>>>()?;
        let response_partition_limit = dec.get_i32()?;
        let cursor = Cursor::decode_nullable(dec)?;
        dec.get_empty_tagged_fields()?;

        Ok(Self {
            topics,
            response_partition_limit,
            cursor,
        })
    }

    /// Encodes a v0 body.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_compact_array_len(self.topics.len());
        for name in &self.topics {
            enc.put_compact_string(name);
            enc.put_empty_tagged_fields();
        }
        enc.put_i32(self.response_partition_limit);
        Cursor::encode_nullable(self.cursor.as_ref(), enc);
        enc.put_empty_tagged_fields();
    }
}

/// Description of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedPartition {
    pub error_code: ErrorCode,
    pub partition_index: i32,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
    pub eligible_leader_replicas: Vec<i32>,
    pub last_known_elr: Vec<i32>,
    pub offline_replicas: Vec<i32>,
}

impl DescribedPartition {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_i16(self.error_code.as_i16());
        enc.put_i32(self.partition_index);
        enc.put_i32(self.leader_id);
        enc.put_i32(self.leader_epoch);
        enc.put_compact_i32_array(&self.replica_nodes);
        enc.put_compact_i32_array(&self.isr_nodes);
        enc.put_compact_i32_array(&self.eligible_leader_replicas);
        enc.put_compact_i32_array(&self.last_known_elr);
        enc.put_compact_i32_array(&self.offline_replicas);
        enc.put_empty_tagged_fields();
    }
}

/// Description of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedTopic {
    pub error_code: ErrorCode,
    pub name: String,
    pub topic_id: Uuid,
    pub is_internal: bool,
    pub partitions: Vec<DescribedPartition>,
    pub authorized_operations: i32,
}

impl DescribedTopic {
    /// Entry for a topic name that is not registered.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            error_code: ErrorCode::UnknownTopicOrPartition,
            name: name.into(),
            topic_id: Uuid::nil(),
            is_internal: false,
            partitions: Vec::new(),
            authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
        }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_i16(self.error_code.as_i16());
        enc.put_compact_string(&self.name);
        enc.put_uuid(&self.topic_id);
        enc.put_i8(i8::from(self.is_internal));
        enc.put_compact_array_len(self.partitions.len());
        for partition in &self.partitions {
            partition.encode(enc);
        }
        enc.put_i32(self.authorized_operations);
        enc.put_empty_tagged_fields();
    }
}

/// `DescribeTopicPartitions` response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescribeTopicPartitionsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<DescribedTopic>,
    pub next_cursor: Option<Cursor>,
}

impl DescribeTopicPartitionsResponse {
    pub fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.throttle_time_ms);
        enc.put_compact_array_len(self.topics.len());
        for topic in &self.topics {
            topic.encode(enc);
        }
        Cursor::encode_nullable(self.next_cursor.as_ref(), enc);
        enc.put_empty_tagged_fields();
    }
}
