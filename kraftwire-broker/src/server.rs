//! Broker TCP server.
//!
//! Accepts connections speaking the Kafka wire protocol and answers each
//! request frame in order. Requests on one connection are handled one at a
//! time; connections run concurrently.

use std::{net::SocketAddr, sync::Arc};

use bytes::BytesMut;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};
use tracing::{debug, error, info, warn};

use crate::{
    codec,
    config::BrokerConfig,
    error::{BrokerError, BrokerResult},
    handler::{self, HandlerContext},
    log_source::{FilesystemLogSource, LogSource},
};

/// Kafka-compatible TCP server answering from a log directory.
pub struct BrokerServer {
    config: BrokerConfig,
    log_source: Arc<dyn LogSource>,
    shutdown: Arc<Notify>,
}

impl BrokerServer {
    /// Create a server reading logs from `config.log_dir`.
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        let log_source = Arc::new(FilesystemLogSource::new(config.log_dir.clone()));
        Self::with_log_source(config, log_source)
    }

    /// Create a server reading logs from `log_source`.
    #[must_use]
    pub fn with_log_source(config: BrokerConfig, log_source: Arc<dyn LogSource>) -> Self {
        Self {
            config,
            log_source,
            shutdown: Arc::new(Notify::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Get a handle to signal shutdown.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Bind the configured address and serve until shutdown is signaled.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind.
    pub async fn run(&self) -> BrokerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until shutdown is signaled.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address cannot be read.
    pub async fn serve(&self, listener: TcpListener) -> BrokerResult<()> {
        info!(
            addr = %listener.local_addr()?,
            log_dir = %self.config.log_dir.display(),
            "Broker listening"
        );

        let ctx = Arc::new(HandlerContext::new(Arc::clone(&self.log_source)));
        let max_message_size = self.config.max_message_size;

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "New connection");
                            let ctx = Arc::clone(&ctx);
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(stream, peer_addr, ctx, max_message_size).await
                                {
                                    match e {
                                        BrokerError::ConnectionClosed => {
                                            debug!(peer = %peer_addr, "Connection closed");
                                        }
                                        _ => {
                                            warn!(peer = %peer_addr, error = %e, "Connection error");
                                        }
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Broker shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handle a single client connection.
///
/// Any error, decode faults included, ends the connection.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<HandlerContext>,
    max_message_size: usize,
) -> BrokerResult<()> {
    let mut read_buf = BytesMut::with_capacity(64 * 1024);

    loop {
        let bytes_read = stream.read_buf(&mut read_buf).await?;
        if bytes_read == 0 {
            return Err(BrokerError::ConnectionClosed);
        }

        while let Some(payload) = codec::read_frame(&mut read_buf, max_message_size)? {
            debug!(peer = %peer_addr, bytes = payload.len(), "Received frame");
            let response = handler::handle_request(&ctx, payload).await?;
            stream.write_all(&response).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn test_new_uses_config() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9092);
        let server = BrokerServer::new(BrokerConfig::new(addr).with_log_dir("/data/logs"));

        assert_eq!(server.config().bind_addr, addr);
        assert_eq!(server.config().log_dir, std::path::PathBuf::from("/data/logs"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = BrokerServer::new(BrokerConfig::default());
        let shutdown = server.shutdown_handle();

        let handle = tokio::spawn(async move { server.serve(listener).await });
        tokio::task::yield_now().await;
        shutdown.notify_one();

        handle.await.unwrap().unwrap();
    }
}
