use common::CorrelationId;

/// One message as carried by the broker.
///
/// The payload is opaque to the broker; the correlation token and the
/// optional reply destination ride alongside it as metadata, never inside
/// the payload itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Token linking a task to its reply.
    pub correlation_id: CorrelationId,
    /// Destination the consumer should publish its reply to, if any.
    pub reply_to: Option<String>,
    /// Opaque message body.
    pub payload: Vec<u8>,
}

impl Delivery {
    /// Creates a delivery with no reply destination.
    pub fn new(correlation_id: CorrelationId, payload: Vec<u8>) -> Self {
        Self {
            correlation_id,
            reply_to: None,
            payload,
        }
    }

    /// Sets the reply destination.
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}
