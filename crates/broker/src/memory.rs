use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    BrokerError, Result,
    broker::{AckLease, Broker, ReplyQueue, WorkConsumer, WorkItem},
    message::Delivery,
};

/// In-memory broker implementation.
///
/// Runs the full broker contract inside one process: named durable work
/// queues with competing consumers and redelivery of unacknowledged
/// items, and ephemeral reply queues removed when their handle drops.
/// Cloning the broker shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

#[derive(Default)]
struct BrokerState {
    work_queues: Mutex<HashMap<String, Arc<WorkQueueState>>>,
    reply_queues: Mutex<HashMap<String, mpsc::UnboundedSender<Delivery>>>,
    fail_publishes: Mutex<u32>,
}

#[derive(Default)]
struct WorkQueueState {
    deliveries: Mutex<VecDeque<Delivery>>,
    notify: Notify,
}

impl WorkQueueState {
    fn push_back(&self, delivery: Delivery) {
        self.deliveries.lock().unwrap().push_back(delivery);
        self.notify.notify_one();
    }

    fn push_front(&self, delivery: Delivery) {
        self.deliveries.lock().unwrap().push_front(delivery);
        self.notify.notify_one();
    }
}

impl InMemoryBroker {
    /// Creates a new empty in-memory broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` publishes fail, for exercising retry paths.
    pub fn fail_next_publishes(&self, count: u32) {
        *self.state.fail_publishes.lock().unwrap() = count;
    }

    /// Returns the number of deliveries waiting on a work queue.
    pub fn work_queue_len(&self, name: &str) -> usize {
        self.state
            .work_queues
            .lock()
            .unwrap()
            .get(name)
            .map(|q| q.deliveries.lock().unwrap().len())
            .unwrap_or(0)
    }

    /// Returns true if a reply queue with the given name currently exists.
    pub fn has_reply_queue(&self, name: &str) -> bool {
        self.state.reply_queues.lock().unwrap().contains_key(name)
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    type ReplyQueue = InMemoryReplyQueue;
    type WorkConsumer = InMemoryWorkConsumer;

    async fn declare_work_queue(&self, name: &str) -> Result<()> {
        self.state
            .work_queues
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn publish(&self, destination: &str, delivery: Delivery) -> Result<()> {
        {
            let mut fail = self.state.fail_publishes.lock().unwrap();
            if *fail > 0 {
                *fail -= 1;
                return Err(BrokerError::PublishFailed(
                    "injected publish failure".to_string(),
                ));
            }
        }

        // Reply queue names are uuid-based and never collide with work queues.
        let reply_sender = self
            .state
            .reply_queues
            .lock()
            .unwrap()
            .get(destination)
            .cloned();
        if let Some(sender) = reply_sender {
            return sender
                .send(delivery)
                .map_err(|_| BrokerError::QueueNotFound(destination.to_string()));
        }

        let queue = self
            .state
            .work_queues
            .lock()
            .unwrap()
            .get(destination)
            .cloned();
        match queue {
            Some(queue) => {
                queue.push_back(delivery);
                Ok(())
            }
            None => Err(BrokerError::QueueNotFound(destination.to_string())),
        }
    }

    async fn open_reply_queue(&self) -> Result<InMemoryReplyQueue> {
        let name = format!("reply-{}", Uuid::new_v4());
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state
            .reply_queues
            .lock()
            .unwrap()
            .insert(name.clone(), sender);
        Ok(InMemoryReplyQueue {
            name,
            receiver,
            state: Arc::clone(&self.state),
        })
    }

    async fn subscribe_work(&self, queue: &str) -> Result<InMemoryWorkConsumer> {
        let state = self
            .state
            .work_queues
            .lock()
            .unwrap()
            .get(queue)
            .cloned()
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;
        Ok(InMemoryWorkConsumer { queue: state })
    }
}

/// Ephemeral reply queue handle; the queue is removed on drop.
pub struct InMemoryReplyQueue {
    name: String,
    receiver: mpsc::UnboundedReceiver<Delivery>,
    state: Arc<BrokerState>,
}

#[async_trait]
impl ReplyQueue for InMemoryReplyQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }
}

impl Drop for InMemoryReplyQueue {
    fn drop(&mut self) {
        self.state.reply_queues.lock().unwrap().remove(&self.name);
    }
}

/// One competing consumer on a work queue.
pub struct InMemoryWorkConsumer {
    queue: Arc<WorkQueueState>,
}

#[async_trait]
impl WorkConsumer for InMemoryWorkConsumer {
    async fn next(&mut self) -> Result<WorkItem> {
        loop {
            // Register for wakeup before checking, so a push landing
            // between the check and the await is not missed.
            let notified = self.queue.notify.notified();
            let popped = self.queue.deliveries.lock().unwrap().pop_front();
            if let Some(delivery) = popped {
                let lease = InMemoryLease {
                    queue: Arc::clone(&self.queue),
                    delivery: Some(delivery.clone()),
                };
                return Ok(WorkItem::new(delivery, Box::new(lease)));
            }
            notified.await;
        }
    }
}

struct InMemoryLease {
    queue: Arc<WorkQueueState>,
    delivery: Option<Delivery>,
}

impl AckLease for InMemoryLease {
    fn ack(mut self: Box<Self>) {
        self.delivery = None;
    }
}

impl Drop for InMemoryLease {
    fn drop(&mut self) {
        // An unacknowledged delivery goes back to the head of its queue.
        if let Some(delivery) = self.delivery.take() {
            self.queue.push_front(delivery);
        }
    }
}

#[cfg(test)]
mod tests {
    use common::CorrelationId;

    use super::*;

    fn delivery(payload: &[u8]) -> Delivery {
        Delivery::new(CorrelationId::new(), payload.to_vec())
    }

    #[tokio::test]
    async fn publish_and_consume_work() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        broker.publish("orders", delivery(b"task")).await.unwrap();

        let mut consumer = broker.subscribe_work("orders").await.unwrap();
        let item = consumer.next().await.unwrap();
        assert_eq!(item.delivery().payload, b"task");
        item.ack();
        assert_eq!(broker.work_queue_len("orders"), 0);
    }

    #[tokio::test]
    async fn declare_is_idempotent() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        broker.publish("orders", delivery(b"task")).await.unwrap();
        broker.declare_work_queue("orders").await.unwrap();
        assert_eq!(broker.work_queue_len("orders"), 1);
    }

    #[tokio::test]
    async fn publish_to_unknown_destination_fails() {
        let broker = InMemoryBroker::new();
        let result = broker.publish("nowhere", delivery(b"task")).await;
        assert!(matches!(result, Err(BrokerError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn unacked_item_is_redelivered() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        broker.publish("orders", delivery(b"task")).await.unwrap();

        let mut consumer = broker.subscribe_work("orders").await.unwrap();
        let item = consumer.next().await.unwrap();
        drop(item);

        let redelivered = consumer.next().await.unwrap();
        assert_eq!(redelivered.delivery().payload, b"task");
        redelivered.ack();
    }

    #[tokio::test]
    async fn competing_consumers_split_deliveries() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        broker.publish("orders", delivery(b"a")).await.unwrap();
        broker.publish("orders", delivery(b"b")).await.unwrap();

        let mut first = broker.subscribe_work("orders").await.unwrap();
        let mut second = broker.subscribe_work("orders").await.unwrap();

        let item_a = first.next().await.unwrap();
        let item_b = second.next().await.unwrap();
        let mut payloads = vec![item_a.delivery().payload.clone(), item_b.delivery().payload.clone()];
        payloads.sort();
        assert_eq!(payloads, vec![b"a".to_vec(), b"b".to_vec()]);
        item_a.ack();
        item_b.ack();
    }

    #[tokio::test]
    async fn consumer_wakes_on_later_publish() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        let mut consumer = broker.subscribe_work("orders").await.unwrap();

        let publisher = broker.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            publisher.publish("orders", delivery(b"late")).await.unwrap();
        });

        let item = consumer.next().await.unwrap();
        assert_eq!(item.delivery().payload, b"late");
        item.ack();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn reply_queue_roundtrip() {
        let broker = InMemoryBroker::new();
        let mut replies = broker.open_reply_queue().await.unwrap();
        assert!(broker.has_reply_queue(replies.name()));

        let correlation_id = CorrelationId::new();
        broker
            .publish(
                &replies.name().to_string(),
                Delivery::new(correlation_id, b"reply".to_vec()),
            )
            .await
            .unwrap();

        let received = replies.recv().await.unwrap();
        assert_eq!(received.correlation_id, correlation_id);
        assert_eq!(received.payload, b"reply");
    }

    #[tokio::test]
    async fn reply_queues_have_unique_names() {
        let broker = InMemoryBroker::new();
        let first = broker.open_reply_queue().await.unwrap();
        let second = broker.open_reply_queue().await.unwrap();
        assert_ne!(first.name(), second.name());
    }

    #[tokio::test]
    async fn dropped_reply_queue_is_removed() {
        let broker = InMemoryBroker::new();
        let replies = broker.open_reply_queue().await.unwrap();
        let name = replies.name().to_string();
        drop(replies);

        assert!(!broker.has_reply_queue(&name));
        let result = broker.publish(&name, delivery(b"orphan")).await;
        assert!(matches!(result, Err(BrokerError::QueueNotFound(_))));
    }

    #[tokio::test]
    async fn injected_publish_failures_are_consumed() {
        let broker = InMemoryBroker::new();
        broker.declare_work_queue("orders").await.unwrap();
        broker.fail_next_publishes(2);

        assert!(broker.publish("orders", delivery(b"x")).await.is_err());
        assert!(broker.publish("orders", delivery(b"x")).await.is_err());
        assert!(broker.publish("orders", delivery(b"x")).await.is_ok());
    }
}
