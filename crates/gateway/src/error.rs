//! Gateway error types.

use std::time::Duration;

use broker::BrokerError;
use domain::OrderError;
use thiserror::Error;

/// Errors that can occur while submitting an order.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The order failed validation; nothing was published.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    /// The broker refused a declare, publish, or subscribe.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// A task or reply payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No correlated reply arrived within the deadline.
    #[error("No reply within {waited:?}")]
    Timeout { waited: Duration },
}
