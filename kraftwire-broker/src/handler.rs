//! Request handler.
//!
//! Decodes a request payload, builds the response for its API from the
//! control log, and encodes the response frame. Every request is handled
//! from scratch: the control log is re-read each time.

use std::sync::Arc;

use bytes::Bytes;
use kraftwire_protocol::messages::{
    ApiVersionsResponse, DescribeTopicPartitionsResponse, DescribedPartition, DescribedTopic,
    FetchPartitionData, FetchResponse, FetchableTopicResponse,
};
use kraftwire_protocol::api::TOPIC_AUTHORIZED_OPERATIONS;
use kraftwire_protocol::{ApiKey, ErrorCode, Message, PartitionRecord, RequestBody, Response};
use tracing::{debug, warn};

use crate::cluster_metadata::ClusterMetadata;
use crate::error::{BrokerError, BrokerResult};
use crate::log_source::LogSource;

/// Shared state for request handling.
#[derive(Clone)]
pub struct HandlerContext {
    log_source: Arc<dyn LogSource>,
}

impl HandlerContext {
    #[must_use]
    pub fn new(log_source: Arc<dyn LogSource>) -> Self {
        Self { log_source }
    }

    #[must_use]
    pub fn log_source(&self) -> &dyn LogSource {
        self.log_source.as_ref()
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext").finish_non_exhaustive()
    }
}

/// Handles one request payload (the frame without its length prefix) and
/// returns the complete response frame.
///
/// # Errors
///
/// Returns an error if the request or a log fails to decode, or if the api
/// key is not served.
pub async fn handle_request(ctx: &HandlerContext, payload: Bytes) -> BrokerResult<Bytes> {
    let message = Message::decode(payload)?;
    debug!(
        api_key = message.header.api_key,
        api_version = message.header.api_version,
        correlation_id = message.header.correlation_id,
        client_id = message.header.client_id.as_deref().unwrap_or(""),
        "Handling request"
    );

    let response = build_response(ctx, &message).await?;
    Ok(response.encode_framed(message.header.correlation_id))
}

/// Builds the typed response for a decoded request.
///
/// # Errors
///
/// Same as [`handle_request`].
pub async fn build_response(ctx: &HandlerContext, message: &Message) -> BrokerResult<Response> {
    match ApiKey::from_i16(message.header.api_key) {
        Some(ApiKey::ApiVersions) => Ok(Response::ApiVersions(build_api_versions(message))),
        Some(ApiKey::DescribeTopicPartitions) => build_describe_topic_partitions(ctx, message)
            .await
            .map(Response::DescribeTopicPartitions),
        Some(ApiKey::Fetch) => build_fetch(ctx, message).await.map(Response::Fetch),
        None => {
            warn!(api_key = message.header.api_key, "Unsupported API");
            Err(BrokerError::UnsupportedApi {
                api_key: message.header.api_key,
            })
        }
    }
}

/// `ApiVersions`: the advertised API list, or just the error code.
#[must_use]
pub fn build_api_versions(message: &Message) -> ApiVersionsResponse {
    match message.error {
        Some(error) => ApiVersionsResponse::error(error),
        None => ApiVersionsResponse::supported(),
    }
}

/// `DescribeTopicPartitions`: one entry per requested name, in request order.
///
/// # Errors
///
/// Returns an error if the control log fails to decode.
pub async fn build_describe_topic_partitions(
    ctx: &HandlerContext,
    message: &Message,
) -> BrokerResult<DescribeTopicPartitionsResponse> {
    let (None, RequestBody::DescribeTopicPartitions(request)) = (message.error, &message.body)
    else {
        return Ok(DescribeTopicPartitionsResponse::default());
    };

    let metadata = ClusterMetadata::load_cluster(ctx.log_source()).await?;
    let mut topics = Vec::with_capacity(request.topics.len());
    for name in &request.topics {
        let Some(topic) = metadata.topic_by_name(name)? else {
            debug!(topic = %name, "Unknown topic");
            topics.push(DescribedTopic::unknown(name.as_str()));
            continue;
        };

        let partitions = metadata
            .partitions_by_topic_id(&topic.topic_id)?
            .iter()
            .map(describe_partition)
            .collect();
        topics.push(DescribedTopic {
            error_code: ErrorCode::None,
            name: topic.name,
            topic_id: topic.topic_id,
            is_internal: false,
            partitions,
            authorized_operations: TOPIC_AUTHORIZED_OPERATIONS,
        });
    }

    Ok(DescribeTopicPartitionsResponse {
        throttle_time_ms: 0,
        topics,
        next_cursor: None,
    })
}

fn describe_partition(partition: &PartitionRecord) -> DescribedPartition {
    DescribedPartition {
        error_code: ErrorCode::None,
        partition_index: partition.partition_id,
        leader_id: partition.leader,
        leader_epoch: partition.leader_epoch,
        replica_nodes: partition.replicas.clone(),
        isr_nodes: partition.isr.clone(),
        eligible_leader_replicas: Vec::new(),
        last_known_elr: Vec::new(),
        offline_replicas: Vec::new(),
    }
}

/// `Fetch`: for each requested topic id, every registered partition with the
/// batches of its log.
///
/// # Errors
///
/// Returns an error if the control log or a partition log fails to decode.
pub async fn build_fetch(ctx: &HandlerContext, message: &Message) -> BrokerResult<FetchResponse> {
    if let Some(error) = message.error {
        return Ok(FetchResponse::error(error));
    }
    let RequestBody::Fetch(request) = &message.body else {
        return Ok(FetchResponse::new(Vec::new()));
    };

    let metadata = ClusterMetadata::load_cluster(ctx.log_source()).await?;
    let mut responses = Vec::with_capacity(request.topics.len());
    for requested in &request.topics {
        let topic_id = requested.topic_id;
        let Some(topic) = metadata.topic_by_id(&topic_id)? else {
            debug!(%topic_id, "Unknown topic id");
            responses.push(FetchableTopicResponse {
                topic_id,
                partitions: vec![FetchPartitionData::empty(0, ErrorCode::UnknownTopic)],
            });
            continue;
        };

        let mut partitions = Vec::new();
        for partition in metadata.partitions_by_topic_id(&topic_id)? {
            let log =
                ClusterMetadata::load(ctx.log_source(), &topic.name, partition.partition_id)
                    .await?;
            partitions.push(FetchPartitionData::with_records(
                partition.partition_id,
                log.into_batches(),
            ));
        }
        responses.push(FetchableTopicResponse {
            topic_id,
            partitions,
        });
    }

    Ok(FetchResponse::new(responses))
}

#[cfg(test)]
mod tests {
    use bytes::Buf;
    use kraftwire_protocol::messages::{DescribeTopicPartitionsRequest, FetchRequest, FetchTopic};
    use kraftwire_protocol::{ControlRecord, Record, RecordBatch, RequestHeader, TopicRecord};
    use uuid::Uuid;

    use super::*;
    use crate::log_source::{InMemoryLogSource, CLUSTER_METADATA_PARTITION, CLUSTER_METADATA_TOPIC};

    const FOO_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0f00);

    fn context() -> (Arc<InMemoryLogSource>, HandlerContext) {
        let source = Arc::new(InMemoryLogSource::new());
        let topic = ControlRecord::Topic(TopicRecord {
            name: "foo".to_string(),
            topic_id: FOO_ID,
        });
        let mut partition = PartitionRecord::new(FOO_ID, 0, 1);
        partition.leader_epoch = 4;
        let batch = RecordBatch::new(
            0,
            vec![
                Record::new(0, None, Some(topic.encode(0))),
                Record::new(1, None, Some(ControlRecord::Partition(partition).encode(1))),
            ],
        );
        source.insert(
            CLUSTER_METADATA_TOPIC,
            CLUSTER_METADATA_PARTITION,
            RecordBatch::encode_all(&[batch]),
        );
        let ctx = HandlerContext::new(source.clone());
        (source, ctx)
    }

    fn message(api_key: i16, api_version: i16, body: RequestBody) -> Message {
        Message {
            size: 0,
            header: RequestHeader {
                api_key,
                api_version,
                correlation_id: 1,
                client_id: None,
            },
            error: None,
            body,
        }
    }

    #[tokio::test]
    async fn test_api_versions_frame() {
        let (_, ctx) = context();
        let payload = Message::encode_request(
            &RequestHeader {
                api_key: 18,
                api_version: 4,
                correlation_id: 99,
                client_id: None,
            },
            &RequestBody::ApiVersions,
        )
        .slice(4..);

        let mut frame = handle_request(&ctx, payload).await.unwrap();
        assert_eq!(frame.get_u32() as usize, frame.len());
        assert_eq!(frame.get_i32(), 99);
        assert_eq!(frame.get_i16(), 0);
        assert_eq!(frame.get_u8(), 4);
    }

    #[tokio::test]
    async fn test_describe_known_and_unknown() {
        let (_, ctx) = context();
        let body = RequestBody::DescribeTopicPartitions(DescribeTopicPartitionsRequest::new([
            "missing", "foo",
        ]));
        let response = build_describe_topic_partitions(&ctx, &message(75, 0, body))
            .await
            .unwrap();

        assert_eq!(response.topics.len(), 2);
        assert_eq!(response.topics[0], DescribedTopic::unknown("missing"));

        let foo = &response.topics[1];
        assert_eq!(foo.error_code, ErrorCode::None);
        assert_eq!(foo.topic_id, FOO_ID);
        assert_eq!(foo.authorized_operations, 3576);
        assert_eq!(foo.partitions.len(), 1);
        assert_eq!(foo.partitions[0].leader_id, 1);
        assert_eq!(foo.partitions[0].leader_epoch, 4);
        assert_eq!(foo.partitions[0].replica_nodes, vec![1]);
        assert!(response.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_describe_unsupported_version_has_no_topics() {
        let (_, ctx) = context();
        let mut msg = message(75, 7, RequestBody::Unknown);
        msg.error = Some(ErrorCode::UnsupportedVersion);

        let response = build_describe_topic_partitions(&ctx, &msg).await.unwrap();
        assert!(response.topics.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unknown_topic() {
        let (_, ctx) = context();
        let missing = Uuid::from_u128(42);
        let body = RequestBody::Fetch(FetchRequest {
            topics: vec![FetchTopic::new(missing, &[0])],
            ..FetchRequest::default()
        });
        let response = build_fetch(&ctx, &message(1, 4, body)).await.unwrap();

        assert_eq!(response.error_code, ErrorCode::None);
        assert_eq!(response.responses[0].topic_id, missing);
        assert_eq!(
            response.responses[0].partitions,
            vec![FetchPartitionData::empty(0, ErrorCode::UnknownTopic)]
        );
    }

    #[tokio::test]
    async fn test_fetch_known_topic_without_log_is_empty() {
        let (_, ctx) = context();
        let body = RequestBody::Fetch(FetchRequest {
            topics: vec![FetchTopic::new(FOO_ID, &[0])],
            ..FetchRequest::default()
        });
        let response = build_fetch(&ctx, &message(1, 4, body)).await.unwrap();

        let partitions = &response.responses[0].partitions;
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].error_code, ErrorCode::None);
        assert!(partitions[0].records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_known_topic_returns_log_batches() {
        let (source, ctx) = context();
        let batch = RecordBatch::new(
            0,
            vec![Record::new(0, None, Some(Bytes::from_static(b"Hello World!")))],
        );
        source.insert("foo", 0, RecordBatch::encode_all(&[batch.clone()]));

        let body = RequestBody::Fetch(FetchRequest {
            topics: vec![FetchTopic::new(FOO_ID, &[0])],
            ..FetchRequest::default()
        });
        let response = build_fetch(&ctx, &message(1, 4, body)).await.unwrap();
        assert_eq!(response.responses[0].partitions[0].records, vec![batch]);
    }

    #[tokio::test]
    async fn test_fetch_unsupported_version() {
        let (_, ctx) = context();
        let mut msg = message(1, 16, RequestBody::Unknown);
        msg.error = Some(ErrorCode::UnsupportedVersion);

        let response = build_fetch(&ctx, &msg).await.unwrap();
        assert_eq!(response.error_code, ErrorCode::UnsupportedVersion);
        assert!(response.responses.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_api_is_error() {
        let (_, ctx) = context();
        let err = build_response(&ctx, &message(3, 0, RequestBody::Unknown))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::UnsupportedApi { api_key: 3 }));
    }

    #[tokio::test]
    async fn test_corrupt_control_log_is_error() {
        let (source, ctx) = context();
        source.insert(CLUSTER_METADATA_TOPIC, CLUSTER_METADATA_PARTITION, vec![0, 0, 0, 0, 0]);
        let body = RequestBody::DescribeTopicPartitions(DescribeTopicPartitionsRequest::new(["foo"]));

        let err = build_describe_topic_partitions(&ctx, &message(75, 0, body))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Protocol(_)));
    }
}
