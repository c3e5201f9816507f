//! Domain error types.

use thiserror::Error;

/// Errors raised when validating a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order identifier is missing or not positive.
    #[error("Invalid order id: {0}")]
    InvalidId(i64),

    /// The region code is empty.
    #[error("Order {0} has an empty region code")]
    EmptyRegion(i64),

    /// The order carries no lines.
    #[error("Order {0} has no lines")]
    NoLines(i64),

    /// A line requests a zero quantity.
    #[error("Order {order_id} line for item {item_id} has invalid quantity {quantity}")]
    InvalidQuantity {
        order_id: i64,
        item_id: i64,
        quantity: u32,
    },
}
