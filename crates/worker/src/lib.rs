//! Worker side of the fulfillment exchange.
//!
//! A [`Worker`] runs one sequential consume loop over the shared work
//! queue, resolves every order line through its [`Selection`]
//! collaborator, and publishes exactly one correlated reply per task.
//! Throughput scales by running more worker instances against the same
//! queue.

pub mod error;
pub mod inventory;
pub mod postgres;
pub mod selection;
pub mod worker;

pub use error::WorkerError;
pub use inventory::{Center, InMemoryInventory};
pub use postgres::PgSelection;
pub use selection::{Selection, SelectionError};
pub use worker::Worker;
