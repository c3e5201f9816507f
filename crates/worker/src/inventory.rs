//! In-memory inventory-backed selection.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::selection::{Selection, SelectionError};

/// One fulfillment center and its per-item stock.
#[derive(Debug, Clone)]
pub struct Center {
    /// Stable identifier, used as the final tie-break.
    pub id: i64,
    /// Center name as returned in decisions (e.g. `"CD-SP-1"`).
    pub name: String,
    /// Region the center is located in.
    pub region: String,
    stock: HashMap<i64, u32>,
}

impl Center {
    /// Creates a center with no stock.
    pub fn new(id: i64, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            region: region.into(),
            stock: HashMap::new(),
        }
    }

    /// Sets the stocked quantity for an item.
    pub fn with_stock(mut self, item_id: i64, quantity: u32) -> Self {
        self.stock.insert(item_id, quantity);
        self
    }

    fn holds(&self, item_id: i64, quantity: u32) -> bool {
        self.stock.get(&item_id).is_some_and(|held| *held >= quantity)
    }
}

#[derive(Debug, Default)]
struct InventoryState {
    centers: Vec<Center>,
    fail_message: Option<String>,
}

/// In-memory selection over a fixed set of centers.
///
/// Used by tests and the default process wiring; a deployment against
/// a persistent inventory swaps in [`crate::PgSelection`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory holding the given centers.
    pub fn with_centers(centers: Vec<Center>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InventoryState {
                centers,
                fail_message: None,
            })),
        }
    }

    /// Adds a center.
    pub fn add_center(&self, center: Center) {
        self.state.write().unwrap().centers.push(center);
    }

    /// Makes every subsequent `select` call fail with the given message,
    /// or restores normal behavior when `None`.
    pub fn set_fail(&self, message: Option<String>) {
        self.state.write().unwrap().fail_message = message;
    }
}

#[async_trait]
impl Selection for InMemoryInventory {
    async fn select(
        &self,
        item_id: i64,
        region: &str,
        quantity: u32,
    ) -> Result<Option<String>, SelectionError> {
        let state = self.state.read().unwrap();

        if let Some(ref message) = state.fail_message {
            return Err(SelectionError::Failed(message.clone()));
        }

        // Same ordering as the persistent query: in-region first, then
        // lowest center id.
        let selected = state
            .centers
            .iter()
            .filter(|center| center.holds(item_id, quantity))
            .min_by_key(|center| (center.region != region, center.id));

        Ok(selected.map(|center| center.name.clone()))
    }
}
