//! KRaft control records.
//!
//! The value of every record in the `__cluster_metadata` log is an envelope
//! followed by a typed payload:
//!
//! ```text
//! frame_version (int8) | record_type (int8) | version (int8) | payload...
//! ```
//!
//! Only topic and partition registrations are interpreted; every other
//! record type decodes as [`ControlRecord::Unrecognized`].

use bytes::Bytes;
use uuid::Uuid;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::ProtocolResult;

/// Envelope frame version written by current brokers.
pub const CONTROL_RECORD_FRAME_VERSION: i8 = 1;

/// Record type of a topic registration.
pub const TOPIC_RECORD_TYPE: i8 = 2;

/// Record type of a partition registration.
pub const PARTITION_RECORD_TYPE: i8 = 3;

/// A decoded control record value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRecord {
    /// Topic registration.
    Topic(TopicRecord),
    /// Partition registration.
    Partition(PartitionRecord),
    /// Any record type that is not interpreted. Its payload is skipped.
    Unrecognized {
        /// Wire record type.
        record_type: i8,
    },
}

impl ControlRecord {
    /// Decodes a record value, envelope included.
    ///
    /// # Errors
    /// Returns an error if the envelope or a recognised payload is malformed.
    pub fn decode(value: impl Into<Bytes>) -> ProtocolResult<Self> {
        let mut dec = Decoder::new(value);
        let _frame_version = dec.get_i8()?;
        let record_type = dec.get_i8()?;
        let version = dec.get_i8()?;

        match record_type {
            TOPIC_RECORD_TYPE => TopicRecord::decode(&mut dec).map(Self::Topic),
            PARTITION_RECORD_TYPE => {
                PartitionRecord::decode(&mut dec, version).map(Self::Partition)
            }
            _ => Ok(Self::Unrecognized { record_type }),
        }
    }

    /// Encodes the record value with the given payload `version`.
    ///
    /// Unrecognized records encode as a bare envelope.
    #[must_use]
    pub fn encode(&self, version: i8) -> Bytes {
        let mut enc = Encoder::new();
        enc.put_i8(CONTROL_RECORD_FRAME_VERSION);
        match self {
            Self::Topic(topic) => {
                enc.put_i8(TOPIC_RECORD_TYPE);
                enc.put_i8(version);
                topic.encode(&mut enc);
            }
            Self::Partition(partition) => {
                enc.put_i8(PARTITION_RECORD_TYPE);
                enc.put_i8(version);
                partition.encode(&mut enc, version);
            }
            Self::Unrecognized { record_type } => {
                enc.put_i8(*record_type);
                enc.put_i8(version);
            }
        }
        enc.into_bytes()
    }
}

/// Registers a topic name under a topic id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub name: String,
    pub topic_id: Uuid,
}

impl TopicRecord {
    fn decode(dec: &mut Decoder) -> ProtocolResult<Self> {
        let name = dec.get_compact_string()?;
        let topic_id = dec.get_uuid()?;
        dec.get_empty_tagged_fields()?;
        Ok(Self { name, topic_id })
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.put_compact_string(&self.name);
        enc.put_uuid(&self.topic_id);
        enc.put_empty_tagged_fields();
    }
}

/// Registers one partition of a topic with its replica assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRecord {
    pub partition_id: i32,
    pub topic_id: Uuid,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub removing_replicas: Vec<i32>,
    pub adding_replicas: Vec<i32>,
    pub leader: i32,
    pub leader_epoch: i32,
    pub partition_epoch: i32,
    /// Log directories per replica; present on the wire from version 1.
    pub directories: Vec<Uuid>,
}

impl PartitionRecord {
    /// Creates a single-replica partition led by `leader`.
    #[must_use]
    pub fn new(topic_id: Uuid, partition_id: i32, leader: i32) -> Self {
        Self {
            partition_id,
            topic_id,
            replicas: vec![leader],
            isr: vec![leader],
            removing_replicas: Vec::new(),
            adding_replicas: Vec::new(),
            leader,
            leader_epoch: 0,
            partition_epoch: 0,
            directories: Vec::new(),
        }
    }

    fn decode(dec: &mut Decoder, version: i8) -> ProtocolResult<Self> {
        let partition_id = dec.get_i32()?;
        let topic_id = dec.get_uuid()?;
        let replicas = dec.get_compact_i32_array()?;
        let isr = dec.get_compact_i32_array()?;
        let removing_replicas = dec.get_compact_i32_array()?;
        let adding_replicas = dec.get_compact_i32_array()?;
        let leader = dec.get_i32()?;
        let leader_epoch = dec.get_i32()?;
        let partition_epoch = dec.get_i32()?;
        let directories = if version >= 1 {
            dec.get_compact_uuid_array()?
        } else {
            Vec::new()
        };
        dec.get_empty_tagged_fields()?;

        Ok(Self {
            partition_id,
            topic_id,
            replicas,
            isr,
            removing_replicas,
            adding_replicas,
            leader,
            leader_epoch,
            partition_epoch,
            directories,
        })
    }

    fn encode(&self, enc: &mut Encoder, version: i8) {
        enc.put_i32(self.partition_id);
        enc.put_uuid(&self.topic_id);
        enc.put_compact_i32_array(&self.replicas);
        enc.put_compact_i32_array(&self.isr);
        enc.put_compact_i32_array(&self.removing_replicas);
        enc.put_compact_i32_array(&self.adding_replicas);
        enc.put_i32(self.leader);
        enc.put_i32(self.leader_epoch);
        enc.put_i32(self.partition_epoch);
        if version >= 1 {
            enc.put_compact_uuid_array(&self.directories);
        }
        enc.put_empty_tagged_fields();
    }
}
