//! Control log reader.
//!
//! Reads a partition log through a [`LogSource`] and answers topic and
//! partition lookups from the KRaft control records it contains. Nothing is
//! cached: every query re-reads the log.

use bytes::Bytes;
use kraftwire_protocol::{
    ControlRecord, PartitionRecord, ProtocolResult, RecordBatch, TopicRecord,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BrokerResult;
use crate::log_source::{LogSource, CLUSTER_METADATA_PARTITION, CLUSTER_METADATA_TOPIC};

/// Record batches of one partition log, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMetadata {
    batches: Vec<RecordBatch>,
}

impl ClusterMetadata {
    /// Metadata over already-decoded batches.
    #[must_use]
    pub const fn new(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }

    /// Decodes a whole log segment.
    ///
    /// # Errors
    /// Returns the first batch decode failure.
    pub fn from_log(data: Bytes) -> ProtocolResult<Self> {
        RecordBatch::decode_all(data).map(Self::new)
    }

    /// Loads the log of `(topic, partition)`.
    ///
    /// A missing log yields empty metadata. So does a log that exists but
    /// cannot be read; that case is logged.
    ///
    /// # Errors
    /// Returns an error if the log bytes do not decode as record batches.
    pub async fn load(source: &dyn LogSource, topic: &str, partition: i32) -> BrokerResult<Self> {
        let data = match source.read_log(topic, partition).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(topic, partition, "No log, using empty metadata");
                return Ok(Self::default());
            }
            Err(e) => {
                warn!(topic, partition, error = %e, "Unreadable log, using empty metadata");
                return Ok(Self::default());
            }
        };

        let metadata = Self::from_log(data)?;
        debug!(topic, partition, batches = metadata.batches.len(), "Loaded log");
        Ok(metadata)
    }

    /// Loads the KRaft control log.
    ///
    /// # Errors
    /// Same as [`ClusterMetadata::load`].
    pub async fn load_cluster(source: &dyn LogSource) -> BrokerResult<Self> {
        Self::load(source, CLUSTER_METADATA_TOPIC, CLUSTER_METADATA_PARTITION).await
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    /// Control records in log order. Records with a null value are skipped.
    fn control_records(&self) -> impl Iterator<Item = ProtocolResult<ControlRecord>> + '_ {
        self.batches
            .iter()
            .flat_map(|batch| &batch.records)
            .filter_map(|record| record.value.clone())
            .map(ControlRecord::decode)
    }

    /// First topic registered under `topic_id`.
    ///
    /// # Errors
    /// Returns an error if a record value before the match fails to decode.
    pub fn topic_by_id(&self, topic_id: &Uuid) -> ProtocolResult<Option<TopicRecord>> {
        for record in self.control_records() {
            if let ControlRecord::Topic(topic) = record? {
                if topic.topic_id == *topic_id {
                    return Ok(Some(topic));
                }
            }
        }
        Ok(None)
    }

    /// First topic registered under `name`.
    ///
    /// # Errors
    /// Returns an error if a record value before the match fails to decode.
    pub fn topic_by_name(&self, name: &str) -> ProtocolResult<Option<TopicRecord>> {
        for record in self.control_records() {
            if let ControlRecord::Topic(topic) = record? {
                if topic.name == name {
                    return Ok(Some(topic));
                }
            }
        }
        Ok(None)
    }

    /// Every partition registered for `topic_id`, in log order.
    ///
    /// # Errors
    /// Returns an error if any record value fails to decode.
    pub fn partitions_by_topic_id(&self, topic_id: &Uuid) -> ProtocolResult<Vec<PartitionRecord>> {
        let mut partitions = Vec::new();
        for record in self.control_records() {
            if let ControlRecord::Partition(partition) = record? {
                if partition.topic_id == *topic_id {
                    partitions.push(partition);
                }
            }
        }
        Ok(partitions)
    }
}
