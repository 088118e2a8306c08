//! Retrieval of raw log segment bytes.
//!
//! # Directory Structure
//!
//! Logs are stored at: `{log_dir}/{topic}-{partition}/00000000000000000000.log`
//!
//! Only the first segment is ever read. The broker never writes to a log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{BrokerError, BrokerResult};

/// Topic holding the KRaft control records.
pub const CLUSTER_METADATA_TOPIC: &str = "__cluster_metadata";

/// Partition of [`CLUSTER_METADATA_TOPIC`] holding the control records.
pub const CLUSTER_METADATA_PARTITION: i32 = 0;

/// File name of the first segment in every partition directory.
pub const FIRST_SEGMENT_FILE_NAME: &str = "00000000000000000000.log";

/// Source of log bytes for a `(topic, partition)`.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Reads the whole log for a partition.
    ///
    /// Returns `Ok(None)` if the partition has no log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    async fn read_log(&self, topic: &str, partition: i32) -> BrokerResult<Option<Bytes>>;
}

// -----------------------------------------------------------------------------
// FilesystemLogSource
// -----------------------------------------------------------------------------

/// Reads logs from a Kafka log directory.
#[derive(Debug, Clone)]
pub struct FilesystemLogSource {
    log_dir: PathBuf,
}

impl FilesystemLogSource {
    /// Creates a source rooted at `log_dir`.
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the first segment of a partition.
    #[must_use]
    pub fn log_path(&self, topic: &str, partition: i32) -> PathBuf {
        self.log_dir
            .join(format!("{topic}-{partition}"))
            .join(FIRST_SEGMENT_FILE_NAME)
    }
}

#[async_trait]
impl LogSource for FilesystemLogSource {
    async fn read_log(&self, topic: &str, partition: i32) -> BrokerResult<Option<Bytes>> {
        let path = self.log_path(topic, partition);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "Read log");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BrokerError::log_read(path, e)),
        }
    }
}

// -----------------------------------------------------------------------------
// InMemoryLogSource
// -----------------------------------------------------------------------------

/// In-memory log source for tests.
#[derive(Debug, Default)]
pub struct InMemoryLogSource {
    logs: RwLock<HashMap<(String, i32), Bytes>>,
}

impl InMemoryLogSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` as the log of `(topic, partition)`, replacing any
    /// previous contents.
    pub fn insert(&self, topic: impl Into<String>, partition: i32, data: impl Into<Bytes>) {
        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((topic.into(), partition), data.into());
    }
}

#[async_trait]
impl LogSource for InMemoryLogSource {
    async fn read_log(&self, topic: &str, partition: i32) -> BrokerResult<Option<Bytes>> {
        let logs = self.logs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(logs.get(&(topic.to_string(), partition)).cloned())
    }
}
