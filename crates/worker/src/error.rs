//! Worker error types.

use broker::BrokerError;
use thiserror::Error;

/// Errors fatal to a worker's consume loop.
///
/// Per-task problems (undecodable payloads, selection failures, reply
/// publishes that exhaust their retries) are logged and absorbed; only
/// the loop's own broker connection surfaces here.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The broker refused a declare or subscribe, or the queue is gone.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
}
