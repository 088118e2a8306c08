//! Kafka broker answering from a KRaft control log.
//!
//! Serves three APIs over the Kafka wire protocol without a write path:
//! topic and partition metadata come from the `__cluster_metadata` log, and
//! fetches return the record batches of each partition's log as stored.
//!
//! # Architecture
//!
//! ```text
//! Kafka Client ──── Kafka Protocol ────► BrokerServer ────► handler
//!                       :9092                                  │
//!                                                              ▼
//!                                                      ClusterMetadata
//!                                                              │
//!                                                              ▼
//!                                                 LogSource ({log_dir}/{topic}-{partition})
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cluster_metadata;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod log_source;
pub mod server;

pub use cluster_metadata::ClusterMetadata;
pub use config::BrokerConfig;
pub use error::{BrokerError, BrokerResult};
pub use handler::{handle_request, HandlerContext};
pub use log_source::{FilesystemLogSource, InMemoryLogSource, LogSource};
pub use server::BrokerServer;
