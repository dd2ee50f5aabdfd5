//! In-process loopback broker.
//!
//! Backs single-process deployments and the integration tests. Queues are
//! created lazily; consumers on the same queue compete for messages through a
//! shared receiver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

use super::service::{QueueConsumer, QueueError, QueuePublisher};

type SharedReceiver = Arc<AsyncMutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

#[derive(Clone)]
struct Channel {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: SharedReceiver,
}

/// Loopback broker holding one channel per queue name.
///
/// Cloning shares the underlying queues, so a clone can publish to queues
/// another clone consumes from.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    queues: Arc<Mutex<HashMap<String, Channel>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, queue: &str) -> Channel {
        let mut queues = self.queues.lock().expect("memory queue lock poisoned");
        queues
            .entry(queue.to_string())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                Channel {
                    tx,
                    rx: Arc::new(AsyncMutex::new(rx)),
                }
            })
            .clone()
    }

    /// Creates a competing consumer on `queue`.
    pub fn consumer(&self, queue: &str) -> MemoryQueueConsumer {
        MemoryQueueConsumer {
            rx: self.channel(queue).rx,
        }
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        self.channel(queue)
            .tx
            .send(payload)
            .map_err(|_| QueueError::Publish {
                queue: queue.to_string(),
                reason: "all consumers dropped".to_string(),
            })
    }
}

/// Consumer handle over a shared in-memory receiver.
///
/// The channel pop is destructive, so delivery is effectively acknowledged
/// at `recv` time; `ack` exists to satisfy the broker contract and does
/// nothing. Loopback queues live and die with the process anyway.
pub struct MemoryQueueConsumer {
    rx: SharedReceiver,
}

#[async_trait]
impl QueueConsumer for MemoryQueueConsumer {
    async fn recv(&self) -> Result<Vec<u8>, QueueError> {
        self.rx.lock().await.recv().await.ok_or(QueueError::Closed)
    }

    async fn ack(&self) -> Result<(), QueueError> {
        Ok(())
    }
}
