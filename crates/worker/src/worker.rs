//! The consume loop.

use broker::{Broker, Delivery, WorkConsumer, WorkItem};
use domain::{FulfillmentDecision, Order, OrderResult};

use crate::error::WorkerError;
use crate::selection::Selection;

/// Default number of retries for a failed reply publish.
pub const DEFAULT_PUBLISH_RETRIES: u32 = 3;

/// Consumes order tasks and publishes one correlated reply per task.
pub struct Worker<B: Broker, S: Selection> {
    broker: B,
    selection: S,
    work_queue: String,
    max_publish_retries: u32,
}

impl<B: Broker, S: Selection> Worker<B, S> {
    /// Creates a worker over the given broker and selection collaborator.
    pub fn new(broker: B, selection: S, work_queue: impl Into<String>) -> Self {
        Self {
            broker,
            selection,
            work_queue: work_queue.into(),
            max_publish_retries: DEFAULT_PUBLISH_RETRIES,
        }
    }

    /// Overrides the bounded retry count for reply publishes.
    pub fn with_publish_retries(mut self, retries: u32) -> Self {
        self.max_publish_retries = retries;
        self
    }

    /// Runs the consume loop until the broker subscription fails.
    ///
    /// Per-task failures never end the loop; they are logged and the
    /// task is dropped, leaving the originating call to time out.
    pub async fn run(&self) -> Result<(), WorkerError> {
        self.broker.declare_work_queue(&self.work_queue).await?;
        let mut consumer = self.broker.subscribe_work(&self.work_queue).await?;
        tracing::info!(queue = %self.work_queue, "worker consuming");

        loop {
            let item = consumer.next().await?;
            self.process(item).await;
        }
    }

    /// Handles one leased task end to end.
    ///
    /// The task is acknowledged only after the reply publish succeeds,
    /// or once it is deliberately dropped (undecodable payload, missing
    /// reply destination, retries exhausted).
    pub async fn process(&self, item: WorkItem) {
        let started = std::time::Instant::now();
        let delivery = item.delivery().clone();

        let order: Order = match serde_json::from_slice(&delivery.payload) {
            Ok(order) => order,
            Err(e) => {
                metrics::counter!("worker_decode_failures_total").increment(1);
                tracing::warn!(error = %e, "dropping undecodable task");
                item.ack();
                return;
            }
        };

        let Some(reply_to) = delivery.reply_to else {
            metrics::counter!("worker_missing_reply_to_total").increment(1);
            tracing::warn!(order_id = order.id, "dropping task without reply destination");
            item.ack();
            return;
        };

        let result = self.resolve(&order).await;
        let payload = match serde_json::to_vec(&result) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(order_id = order.id, error = %e, "failed to encode reply");
                item.ack();
                return;
            }
        };

        let reply = Delivery::new(delivery.correlation_id, payload);
        match self.publish_reply(&reply_to, reply).await {
            Ok(()) => {
                metrics::counter!("worker_tasks_processed_total").increment(1);
                metrics::histogram!("worker_task_duration_seconds", "outcome" => "completed")
                    .record(started.elapsed().as_secs_f64());
                tracing::debug!(
                    order_id = order.id,
                    correlation_id = %delivery.correlation_id,
                    "reply published"
                );
            }
            Err(e) => {
                metrics::counter!("worker_reply_publish_failures_total").increment(1);
                metrics::histogram!("worker_task_duration_seconds", "outcome" => "reply_failed")
                    .record(started.elapsed().as_secs_f64());
                tracing::error!(
                    order_id = order.id,
                    correlation_id = %delivery.correlation_id,
                    error = %e,
                    "dropping task after failed reply publish"
                );
            }
        }
        // Either outcome removes the task; the no-infinite-retry policy
        // means a lost reply is the caller's timeout, not our loop.
        item.ack();
    }

    /// Builds the result: one decision per input line, input order kept.
    pub async fn resolve(&self, order: &Order) -> OrderResult {
        let mut decisions = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let decision = match self
                .selection
                .select(line.item_id, &order.region, line.quantity)
                .await
            {
                Ok(Some(center)) => FulfillmentDecision::fulfilled(line.item_id, center),
                Ok(None) => FulfillmentDecision::unavailable(line.item_id),
                Err(e) => {
                    tracing::warn!(
                        order_id = order.id,
                        item_id = line.item_id,
                        error = %e,
                        "selection failed, reporting line unavailable"
                    );
                    FulfillmentDecision::unavailable(line.item_id)
                }
            };
            decisions.push(decision);
        }
        OrderResult::new(order.id, decisions)
    }

    async fn publish_reply(
        &self,
        reply_to: &str,
        reply: Delivery,
    ) -> Result<(), broker::BrokerError> {
        let mut attempt = 0;
        loop {
            match self.broker.publish(reply_to, reply.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.max_publish_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "reply publish failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use broker::{CorrelationId, InMemoryBroker, ReplyQueue};
    use domain::{FulfillmentStatus, OrderLine};

    use super::*;
    use crate::inventory::{Center, InMemoryInventory};

    const QUEUE: &str = "order_tasks";

    fn inventory() -> InMemoryInventory {
        InMemoryInventory::with_centers(vec![
            Center::new(1, "CD-SP-1", "SP").with_stock(10, 5).with_stock(11, 2),
            Center::new(2, "CD-RJ-1", "RJ").with_stock(12, 1),
        ])
    }

    async fn publish_task(
        broker: &InMemoryBroker,
        order: &Order,
        reply_to: &str,
    ) -> CorrelationId {
        let correlation_id = CorrelationId::new();
        let task = Delivery::new(correlation_id, serde_json::to_vec(order).unwrap())
            .with_reply_to(reply_to);
        broker.declare_work_queue(QUEUE).await.unwrap();
        broker.publish(QUEUE, task).await.unwrap();
        correlation_id
    }

    #[tokio::test]
    async fn replies_with_decisions_under_original_token() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker.clone(), inventory(), QUEUE);
        let handle = tokio::spawn(async move { worker.run().await });

        let mut replies = broker.open_reply_queue().await.unwrap();
        let order = Order::new(1, "SP", vec![OrderLine::new(10, 2)]);
        let correlation_id = publish_task(&broker, &order, replies.name()).await;

        let reply = replies.recv().await.unwrap();
        assert_eq!(reply.correlation_id, correlation_id);
        let result: OrderResult = serde_json::from_slice(&reply.payload).unwrap();
        assert_eq!(result.order_id, 1);
        assert_eq!(result.lines, vec![FulfillmentDecision::fulfilled(10, "CD-SP-1")]);
        handle.abort();
    }

    #[tokio::test]
    async fn resolve_keeps_line_order_and_mixes_outcomes() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker, inventory(), QUEUE);

        let order = Order::new(
            2,
            "SP",
            vec![OrderLine::new(10, 2), OrderLine::new(99, 1), OrderLine::new(11, 1)],
        );
        let result = worker.resolve(&order).await;

        assert_eq!(result.order_id, 2);
        let items: Vec<i64> = result.lines.iter().map(|d| d.item_id).collect();
        assert_eq!(items, vec![10, 99, 11]);
        assert_eq!(result.lines[0].status, FulfillmentStatus::Fulfilled);
        assert_eq!(result.lines[1].status, FulfillmentStatus::Unavailable);
        assert_eq!(result.lines[1].selected_center, None);
        assert_eq!(result.lines[2].status, FulfillmentStatus::Fulfilled);
    }

    #[tokio::test]
    async fn selection_failure_becomes_unavailable() {
        let broker = InMemoryBroker::new();
        let inventory = inventory();
        inventory.set_fail(Some("store down".to_string()));
        let worker = Worker::new(broker, inventory, QUEUE);

        let order = Order::new(3, "SP", vec![OrderLine::new(10, 1)]);
        let result = worker.resolve(&order).await;
        assert_eq!(result.lines, vec![FulfillmentDecision::unavailable(10)]);
    }

    #[tokio::test]
    async fn undecodable_task_is_dropped_without_reply() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker.clone(), inventory(), QUEUE);
        let handle = tokio::spawn(async move { worker.run().await });

        let mut replies = broker.open_reply_queue().await.unwrap();
        broker.declare_work_queue(QUEUE).await.unwrap();
        broker
            .publish(
                QUEUE,
                Delivery::new(CorrelationId::new(), b"not json".to_vec())
                    .with_reply_to(replies.name()),
            )
            .await
            .unwrap();

        // No reply for the garbage task.
        let reply = tokio::time::timeout(Duration::from_millis(100), replies.recv()).await;
        assert!(reply.is_err());

        // The loop survived and handles the next task.
        let order = Order::new(4, "SP", vec![OrderLine::new(10, 1)]);
        let correlation_id = publish_task(&broker, &order, replies.name()).await;
        let reply = replies.recv().await.unwrap();
        assert_eq!(reply.correlation_id, correlation_id);
        handle.abort();
    }

    #[tokio::test]
    async fn reply_publish_retries_then_drops_task() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker.clone(), inventory(), QUEUE);

        let mut replies = broker.open_reply_queue().await.unwrap();
        let order = Order::new(5, "SP", vec![OrderLine::new(10, 1)]);
        publish_task(&broker, &order, replies.name()).await;

        let mut consumer = broker.subscribe_work(QUEUE).await.unwrap();
        let item = consumer.next().await.unwrap();

        // First attempt plus all retries fail; the task must be dropped,
        // not requeued.
        broker.fail_next_publishes(1 + DEFAULT_PUBLISH_RETRIES);
        worker.process(item).await;

        assert_eq!(broker.work_queue_len(QUEUE), 0);
        let reply = tokio::time::timeout(Duration::from_millis(100), replies.recv()).await;
        assert!(reply.is_err());
    }

    #[tokio::test]
    async fn reply_publish_succeeds_within_retry_budget() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker.clone(), inventory(), QUEUE);

        let mut replies = broker.open_reply_queue().await.unwrap();
        let order = Order::new(6, "SP", vec![OrderLine::new(10, 1)]);
        let correlation_id = publish_task(&broker, &order, replies.name()).await;

        let mut consumer = broker.subscribe_work(QUEUE).await.unwrap();
        let item = consumer.next().await.unwrap();

        broker.fail_next_publishes(2);
        worker.process(item).await;

        let reply = replies.recv().await.unwrap();
        assert_eq!(reply.correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn task_without_reply_destination_is_dropped() {
        let broker = InMemoryBroker::new();
        let worker = Worker::new(broker.clone(), inventory(), QUEUE);

        broker.declare_work_queue(QUEUE).await.unwrap();
        let order = Order::new(7, "SP", vec![OrderLine::new(10, 1)]);
        broker
            .publish(
                QUEUE,
                Delivery::new(CorrelationId::new(), serde_json::to_vec(&order).unwrap()),
            )
            .await
            .unwrap();

        let mut consumer = broker.subscribe_work(QUEUE).await.unwrap();
        let item = consumer.next().await.unwrap();
        worker.process(item).await;
        assert_eq!(broker.work_queue_len(QUEUE), 0);
    }
}
