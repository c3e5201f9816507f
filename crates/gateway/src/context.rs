//! Per-request correlation state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::CorrelationId;
use tokio::time::Instant;

/// State owned by exactly one in-flight `submit` call.
///
/// Created when the request starts, dropped when a matching reply
/// arrives or the deadline elapses, whichever comes first. Never shared
/// across requests.
#[derive(Debug)]
pub struct CorrelationContext {
    /// Token the reply must carry to be accepted.
    pub id: CorrelationId,
    /// Name of the private reply queue for this request.
    pub reply_to: String,
    /// When the request entered the gateway.
    pub created_at: DateTime<Utc>,
    deadline: Instant,
}

impl CorrelationContext {
    /// Creates a context with a fresh correlation token and a deadline
    /// `timeout` from now.
    pub fn new(reply_to: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: CorrelationId::new(),
            reply_to: reply_to.into(),
            created_at: Utc::now(),
            deadline: Instant::now() + timeout,
        }
    }

    /// Time left until the deadline; zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Returns true once the deadline has passed.
    pub fn expired(&self) -> bool {
        self.remaining() == Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_context_is_not_expired() {
        let ctx = CorrelationContext::new("reply-x", Duration::from_secs(5));
        assert!(!ctx.expired());
        assert!(ctx.remaining() > Duration::from_secs(4));
    }

    #[tokio::test]
    async fn context_expires_after_timeout() {
        tokio::time::pause();
        let ctx = CorrelationContext::new("reply-x", Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(11)).await;
        assert!(ctx.expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn contexts_carry_distinct_tokens() {
        let a = CorrelationContext::new("reply-a", Duration::from_secs(1));
        let b = CorrelationContext::new("reply-b", Duration::from_secs(1));
        assert_ne!(a.id, b.id);
    }
}
