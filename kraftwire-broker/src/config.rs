//! Broker configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default Kafka listener port.
pub const DEFAULT_PORT: u16 = 9092;

/// Default directory holding `{topic}-{partition}` log directories.
pub const DEFAULT_LOG_DIR: &str = "/tmp/kraft-combined-logs";

/// Maximum request size (100 MB, same as Kafka default).
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Configuration for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Root of the on-disk logs.
    pub log_dir: PathBuf,
    /// Largest request payload accepted before the connection is dropped.
    pub max_message_size: usize,
}

impl BrokerConfig {
    /// Creates a config with the default log directory and size limit.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Sets the log directory.
    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// Sets the request size limit.
    #[must_use]
    pub const fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9092");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/kraft-combined-logs"));
        assert_eq!(config.max_message_size, MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_config_builders() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 19092);
        let config = BrokerConfig::new(addr)
            .with_log_dir("/var/lib/kraft")
            .with_max_message_size(1024);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.log_dir, PathBuf::from("/var/lib/kraft"));
        assert_eq!(config.max_message_size, 1024);
    }
}
