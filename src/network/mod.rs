//! Network layer for Interpose
//!
//! Hosts the adapter on a TCP listener with bounded concurrency.

mod limit;
mod server;

pub use limit::ConnectionLimit;
pub use server::{Server, ShutdownHandle};

/// Graceful shutdown timeout
pub const SHUTDOWN_TIMEOUT_MS: u64 = 5000;
