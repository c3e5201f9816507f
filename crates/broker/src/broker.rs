use async_trait::async_trait;

use crate::Result;
use crate::message::Delivery;

/// Core trait for broker implementations.
///
/// A broker routes deliveries to two kinds of destinations: durable work
/// queues shared by competing consumers, and ephemeral reply queues
/// exclusive to their creator. All implementations must be thread-safe
/// (Send + Sync); publishing from one task must never block another
/// task's waiting phase.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Handle to an ephemeral reply queue.
    type ReplyQueue: ReplyQueue;
    /// Competing-consumer subscription to a work queue.
    type WorkConsumer: WorkConsumer;

    /// Declares a durable work queue. Declaring an existing queue is a no-op.
    async fn declare_work_queue(&self, name: &str) -> Result<()>;

    /// Publishes a delivery to the named destination.
    ///
    /// The destination may be a work queue or a reply queue. Publishing
    /// to a destination that does not exist (any more) is an error.
    async fn publish(&self, destination: &str, delivery: Delivery) -> Result<()>;

    /// Creates an ephemeral, exclusive reply queue with a unique name.
    ///
    /// The queue is removed when the returned handle is dropped; replies
    /// published to it afterwards fail with `QueueNotFound`.
    async fn open_reply_queue(&self) -> Result<Self::ReplyQueue>;

    /// Subscribes to a work queue as one of its competing consumers.
    ///
    /// Each delivery on the queue reaches exactly one consumer.
    async fn subscribe_work(&self, queue: &str) -> Result<Self::WorkConsumer>;
}

/// Single-consumer handle to an ephemeral reply queue.
#[async_trait]
pub trait ReplyQueue: Send {
    /// The broker-assigned queue name, used as a `reply_to` destination.
    fn name(&self) -> &str;

    /// Receives the next delivery, or `None` once the queue is gone.
    async fn recv(&mut self) -> Option<Delivery>;
}

/// Competing-consumer subscription yielding work items.
#[async_trait]
pub trait WorkConsumer: Send {
    /// Waits for the next available work item.
    async fn next(&mut self) -> Result<WorkItem>;
}

/// One in-flight delivery leased to a consumer.
///
/// The item must be explicitly acknowledged once handled; dropping it
/// unacknowledged returns the delivery to its queue for redelivery
/// (at-least-once).
pub struct WorkItem {
    delivery: Delivery,
    lease: Box<dyn AckLease>,
}

impl WorkItem {
    /// Creates a work item from a delivery and its acknowledgement lease.
    pub fn new(delivery: Delivery, lease: Box<dyn AckLease>) -> Self {
        Self { delivery, lease }
    }

    /// The leased delivery.
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Acknowledges the item, removing it from the queue for good.
    pub fn ack(self) {
        self.lease.ack();
    }
}

/// Implementation-side acknowledgement handle for a leased delivery.
pub trait AckLease: Send {
    /// Marks the delivery as handled.
    fn ack(self: Box<Self>);
}
