//! Message-passing abstraction between the gateway and workers.
//!
//! The [`Broker`] trait models two kinds of destinations: a durable,
//! named work queue with competing consumers and at-least-once delivery,
//! and ephemeral single-consumer reply queues that disappear when their
//! handle is dropped. [`InMemoryBroker`] is the single-process
//! implementation used by the default wiring and the test suites.

pub mod broker;
pub mod error;
pub mod memory;
pub mod message;

pub use broker::{AckLease, Broker, ReplyQueue, WorkConsumer, WorkItem};
pub use common::CorrelationId;
pub use error::{BrokerError, Result};
pub use memory::InMemoryBroker;
pub use message::Delivery;
