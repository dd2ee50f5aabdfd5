//! Broker abstraction: publishers and consumers over named queues.

use async_trait::async_trait;

/// Errors surfaced by the broker layer.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to publish to queue '{queue}': {reason}")]
    Publish { queue: String, reason: String },

    #[error("queue receive failed: {0}")]
    Receive(String),

    #[error("queue acknowledge failed: {0}")]
    Ack(String),

    #[error("queue closed")]
    Closed,
}

/// Publishes raw payloads to a named queue.
///
/// Payloads are opaque bytes; the pipeline serializes its messages to JSON
/// before publishing. Delivery is at-least-once; consumers must tolerate
/// redelivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError>;
}

/// A consumer bound to a single queue at construction time.
///
/// Multiple consumers on the same queue compete for messages (work-sharing),
/// which is how validation workers scale out.
///
/// Delivery is at-least-once: a message stays outstanding until [`ack`] is
/// called, and callers must only ack after their own downstream publish or
/// store write has succeeded. A message received but never acked is
/// redelivered after a restart.
///
/// [`ack`]: QueueConsumer::ack
#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Waits for the next message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] when the queue can never yield another
    /// message (consumer loops exit on this) and [`QueueError::Receive`] for
    /// transient broker failures.
    async fn recv(&self) -> Result<Vec<u8>, QueueError>;

    /// Acknowledges the message most recently returned by [`recv`],
    /// releasing it from redelivery. A no-op when nothing is outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Ack`] when the broker rejects the commit; the
    /// message will be redelivered, so callers log and continue (prefer
    /// duplicates to loss).
    ///
    /// [`recv`]: QueueConsumer::recv
    async fn ack(&self) -> Result<(), QueueError>;
}
