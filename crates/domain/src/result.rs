//! Fulfillment decisions returned for an order.

use serde::{Deserialize, Serialize};

/// Per-line outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    /// A center with sufficient stock was selected.
    Fulfilled,
    /// No center can satisfy the line.
    Unavailable,
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Fulfilled => write!(f, "Fulfilled"),
            FulfillmentStatus::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Decision for a single order line.
///
/// On the wire `selected_center` is a plain string, empty when no center
/// was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentDecision {
    /// Identifier of the item this decision is for.
    pub item_id: i64,
    /// The selected fulfillment center, if any.
    #[serde(with = "center_wire")]
    pub selected_center: Option<String>,
    /// Outcome for this line.
    pub status: FulfillmentStatus,
}

impl FulfillmentDecision {
    /// Creates a `Fulfilled` decision for the given center.
    pub fn fulfilled(item_id: i64, center: impl Into<String>) -> Self {
        Self {
            item_id,
            selected_center: Some(center.into()),
            status: FulfillmentStatus::Fulfilled,
        }
    }

    /// Creates an `Unavailable` decision with no center.
    pub fn unavailable(item_id: i64) -> Self {
        Self {
            item_id,
            selected_center: None,
            status: FulfillmentStatus::Unavailable,
        }
    }
}

/// Aggregated decision for an order.
///
/// Invariant: `lines` carries exactly one decision per line of the
/// originating order, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Identifier of the originating order.
    pub order_id: i64,
    /// One decision per input line, input order preserved.
    pub lines: Vec<FulfillmentDecision>,
}

impl OrderResult {
    /// Creates a new order result.
    pub fn new(order_id: i64, lines: Vec<FulfillmentDecision>) -> Self {
        Self { order_id, lines }
    }
}

/// Serializes `Option<String>` as a plain string, `None` as `""`.
mod center_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        center: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(center.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(if s.is_empty() { None } else { Some(s) })
    }
}
