//! kraftwire broker binary.
//!
//! Serves `ApiVersions`, `DescribeTopicPartitions` and `Fetch` from an
//! existing KRaft log directory:
//!
//! ```bash
//! kraftwire --listen-addr 0.0.0.0:9092 --log-dir /tmp/kraft-combined-logs
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use kraftwire_broker::{BrokerConfig, BrokerServer};

/// Kafka broker answering metadata and fetch requests from a KRaft log.
#[derive(Parser, Debug)]
#[command(name = "kraftwire")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on for client connections.
    #[arg(long, default_value = "0.0.0.0:9092")]
    listen_addr: SocketAddr,

    /// Directory holding `{topic}-{partition}` log directories.
    #[arg(long, default_value = kraftwire_broker::config::DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    /// Largest accepted request, in bytes.
    #[arg(long, default_value_t = kraftwire_broker::config::MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Log to stderr so stdout stays free for tooling.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        listen_addr = %args.listen_addr,
        log_dir = %args.log_dir.display(),
        "Starting kraftwire broker"
    );

    let config = BrokerConfig::new(args.listen_addr)
        .with_log_dir(args.log_dir)
        .with_max_message_size(args.max_message_size);
    BrokerServer::new(config).run().await?;

    Ok(())
}
