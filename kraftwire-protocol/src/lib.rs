//! Kafka wire protocol codec for kraftwire.
//!
//! This crate holds everything that turns bytes into typed values and back:
//! the binary cursor, request and response headers, record batches, KRaft
//! control records, and the per-API message bodies. It performs no I/O.
//!
//! # Supported APIs
//!
//! | API Key | Name | Request versions | Advertised |
//! |---------|------|------------------|------------|
//! | 1 | `Fetch` | 0-4 | 0-17 |
//! | 18 | `ApiVersions` | 0-4 | 0-5 |
//! | 75 | `DescribeTopicPartitions` | 0-4 | 0-11 |
//!
//! # Layout
//!
//! ```text
//! frame ──► Message::decode ──► RequestBody ──► (broker) ──► Response
//!               │                                              │
//!            Decoder                                        Encoder
//!                                                              │
//!                                               Response::encode_framed ──► frame
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header;
pub mod message;
pub mod messages;
pub mod metadata_record;
pub mod record;

pub use api::{ApiKey, ErrorCode, VersionRange, SUPPORTED_REQUEST_VERSIONS};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ProtocolError, ProtocolResult};
pub use header::{RequestHeader, ResponseHeader, ResponseHeaderVersion};
pub use message::{Message, RequestBody};
pub use messages::Response;
pub use metadata_record::{ControlRecord, PartitionRecord, TopicRecord};
pub use record::{Record, RecordBatch, RecordHeader};
