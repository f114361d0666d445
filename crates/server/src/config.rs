//! Startup configuration.
//!
//! All knobs are CLI flags with defaults suitable for local development;
//! `.env` is loaded before parsing so deployments can set flags via the
//! environment shim.

use std::net::SocketAddr;

use clap::Parser;

use crate::queue::OverflowPolicy;

/// Default decompressed-size bound: 64 MiB.
const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// `baler-server` startup flags.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "baler-server",
    about = "Message-driven compression service: JSON job envelopes over framed TCP"
)]
pub struct ServerConfig {
    /// TCP bind address.
    #[arg(long, default_value = "127.0.0.1:5656")]
    pub bind: SocketAddr,

    /// Number of worker tasks.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Bounded job queue capacity.
    #[arg(long, default_value_t = 64)]
    pub queue_capacity: usize,

    /// What enqueue does when the queue is full.
    #[arg(long, value_enum, default_value_t = OverflowPolicy::Block)]
    pub overflow: OverflowPolicy,

    /// Maximum decompressed output size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_DECOMPRESSED_SIZE)]
    pub max_decompressed_size: usize,

    /// Comma-separated algorithm set to register.
    #[arg(long, value_delimiter = ',', default_value = "gzip,zstd,lz4")]
    pub algorithms: Vec<String>,

    /// How long shutdown waits for queued and in-flight jobs to finish.
    #[arg(long, default_value_t = 30)]
    pub drain_timeout_secs: u64,
}

impl ServerConfig {
    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("--workers must be at least 1");
        }
        if self.queue_capacity == 0 {
            anyhow::bail!("--queue-capacity must be at least 1");
        }
        if self.max_decompressed_size == 0 {
            anyhow::bail!("--max-decompressed-size must be at least 1");
        }
        if self.algorithms.is_empty() {
            anyhow::bail!("--algorithms must register at least one algorithm");
        }
        Ok(())
    }
}
