//! Data model for order fulfillment routing.
//!
//! An [`Order`] enters the system over HTTP, travels the work queue, and
//! comes back as an [`OrderResult`] carrying one [`FulfillmentDecision`]
//! per order line.

pub mod error;
pub mod order;
pub mod result;

pub use error::OrderError;
pub use order::{Order, OrderLine};
pub use result::{FulfillmentDecision, FulfillmentStatus, OrderResult};
