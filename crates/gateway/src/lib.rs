//! Gateway between the synchronous HTTP boundary and the work queue.
//!
//! [`Gateway::submit`] publishes one task per order and waits, bounded by
//! a deadline, for the reply carrying the same correlation token. Each
//! call owns a private [`CorrelationContext`] and an ephemeral reply
//! queue; no call observes another's state.

pub mod context;
pub mod error;
pub mod gateway;

pub use context::CorrelationContext;
pub use error::GatewayError;
pub use gateway::Gateway;
