use thiserror::Error;

/// Errors that can occur when interacting with the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The destination queue does not exist (or no longer exists).
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// A publish could not be completed.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// The subscribed queue is gone and no further deliveries will arrive.
    #[error("Consumer disconnected from queue {0}")]
    Disconnected(String),
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
