//! Orders as submitted by clients.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// One requested item within an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Identifier of the requested item.
    pub item_id: i64,
    /// Requested quantity, at least 1.
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(item_id: i64, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// An order as submitted by a client. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Client-assigned order identifier.
    pub id: i64,
    /// Region code of the ordering customer (e.g. `"SP"`).
    pub region: String,
    /// Ordered sequence of requested lines.
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Creates a new order.
    pub fn new(id: i64, region: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        Self {
            id,
            region: region.into(),
            lines,
        }
    }

    /// Checks that the order is well-formed.
    ///
    /// A well-formed order has a positive id, a non-empty region code,
    /// at least one line, and only positive quantities.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.id <= 0 {
            return Err(OrderError::InvalidId(self.id));
        }
        if self.region.trim().is_empty() {
            return Err(OrderError::EmptyRegion(self.id));
        }
        if self.lines.is_empty() {
            return Err(OrderError::NoLines(self.id));
        }
        for line in &self.lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    order_id: self.id,
                    item_id: line.item_id,
                    quantity: line.quantity,
                });
            }
        }
        Ok(())
    }
}
