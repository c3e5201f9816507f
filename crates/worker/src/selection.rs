//! Selection collaborator contract.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised inside a selection implementation.
///
/// The worker never retries these; a failed selection is reported as an
/// `Unavailable` decision for the affected line.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The underlying inventory store failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The selection backend rejected the lookup.
    #[error("Selection failed: {0}")]
    Failed(String),
}

/// Decides which fulfillment center satisfies one order line.
///
/// Deterministic tie-break: among centers holding at least `quantity`
/// units of `item_id`, prefer a center located in `region`; otherwise
/// pick the lowest center id. Pure read, no side effects on inventory;
/// implementations must tolerate concurrent calls.
#[async_trait]
pub trait Selection: Send + Sync {
    /// Returns the name of the selected center, or `None` when no
    /// center can satisfy the line.
    async fn select(
        &self,
        item_id: i64,
        region: &str,
        quantity: u32,
    ) -> Result<Option<String>, SelectionError>;
}
