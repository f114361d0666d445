//! Baler service runtime.
//!
//! Everything between the TCP socket and the compression engine:
//!
//! - [`config`] — CLI startup flags.
//! - [`queue`] — the bounded FIFO job queue shared by the transport and
//!   the workers.
//! - [`worker`] — the supervised worker pool that executes jobs.
//! - [`transport`] — the newline-delimited JSON TCP endpoint.
//!
//! The `baler-server` binary wires these together; see `main.rs`.

pub mod config;
pub mod queue;
pub mod transport;
pub mod worker;

pub use config::ServerConfig;
pub use queue::{JobQueue, JobReceiver, OverflowPolicy, QueuedJob};
pub use worker::WorkerPool;
