//! Order submission over the broker.

use std::time::Duration;

use broker::{Broker, Delivery, ReplyQueue};
use domain::{Order, OrderResult};

use crate::context::CorrelationContext;
use crate::error::GatewayError;

/// Bridges one blocking `submit` call to a one-shot, correlation-matched
/// exchange over the work queue.
pub struct Gateway<B: Broker> {
    broker: B,
    work_queue: String,
    reply_timeout: Duration,
}

impl<B: Broker> Gateway<B> {
    /// Creates a gateway and declares the durable work queue.
    pub async fn new(
        broker: B,
        work_queue: impl Into<String>,
        reply_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let work_queue = work_queue.into();
        broker.declare_work_queue(&work_queue).await?;
        Ok(Self {
            broker,
            work_queue,
            reply_timeout,
        })
    }

    /// The deadline applied to each submit call.
    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    /// Submits one order and waits for its fulfillment decision.
    ///
    /// Publishes a single durable task and blocks on the private reply
    /// queue until the correlated reply arrives or the deadline elapses.
    /// On timeout the task is not retracted; a late reply targets a
    /// queue that no longer exists and is lost, by design of the
    /// at-most-one guarantee.
    #[tracing::instrument(skip(self, order), fields(order_id = order.id))]
    pub async fn submit(&self, order: Order) -> Result<OrderResult, GatewayError> {
        let started = std::time::Instant::now();

        if let Err(e) = order.validate() {
            metrics::counter!("gateway_orders_rejected_total").increment(1);
            return Err(e.into());
        }
        metrics::counter!("gateway_orders_received_total").increment(1);

        // Listening must be established before the task goes out: a
        // worker can reply faster than a late subscription would catch.
        let mut replies = self.broker.open_reply_queue().await?;
        let ctx = CorrelationContext::new(replies.name(), self.reply_timeout);

        let payload = serde_json::to_vec(&order)?;
        let task = Delivery::new(ctx.id, payload).with_reply_to(ctx.reply_to.clone());
        if let Err(e) = self.broker.publish(&self.work_queue, task).await {
            metrics::counter!("gateway_infrastructure_errors_total").increment(1);
            metrics::histogram!("gateway_submit_duration_seconds", "outcome" => "error")
                .record(started.elapsed().as_secs_f64());
            return Err(e.into());
        }
        tracing::debug!(correlation_id = %ctx.id, reply_to = %ctx.reply_to, "task published");

        loop {
            let reply = tokio::time::timeout(ctx.remaining(), replies.recv()).await;
            match reply {
                Ok(Some(delivery)) if delivery.correlation_id == ctx.id => {
                    let result: OrderResult = serde_json::from_slice(&delivery.payload)?;
                    metrics::counter!("gateway_orders_completed_total").increment(1);
                    metrics::histogram!("gateway_submit_duration_seconds", "outcome" => "completed")
                        .record(started.elapsed().as_secs_f64());
                    tracing::debug!(correlation_id = %ctx.id, "reply matched");
                    return Ok(result);
                }
                Ok(Some(delivery)) => {
                    // Should not happen on an exclusive queue, but a stray
                    // token must not end the wait early.
                    tracing::warn!(
                        expected = %ctx.id,
                        received = %delivery.correlation_id,
                        "discarding reply with unexpected correlation token"
                    );
                }
                Ok(None) => {
                    metrics::counter!("gateway_infrastructure_errors_total").increment(1);
                    metrics::histogram!("gateway_submit_duration_seconds", "outcome" => "error")
                        .record(started.elapsed().as_secs_f64());
                    return Err(GatewayError::Broker(broker::BrokerError::Disconnected(
                        ctx.reply_to.clone(),
                    )));
                }
                Err(_) => {
                    metrics::counter!("gateway_orders_timeout_total").increment(1);
                    metrics::histogram!("gateway_submit_duration_seconds", "outcome" => "timeout")
                        .record(started.elapsed().as_secs_f64());
                    tracing::warn!(correlation_id = %ctx.id, "no reply within deadline");
                    return Err(GatewayError::Timeout {
                        waited: self.reply_timeout,
                    });
                }
            }
        }
    }
}
