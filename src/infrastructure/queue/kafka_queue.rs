//! Kafka-backed queue implementation.
//!
//! Queue names map to topics. Consumers in the same group share partitions,
//! giving competing-consumer semantics for the validation workers; the result
//! sink uses its own group with a single member. Offsets are committed only
//! through [`QueueConsumer::ack`], after the caller has finished its
//! downstream work, so an interrupted message is redelivered.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Mutex;
use std::time::Duration;

use super::service::{QueueConsumer, QueueError, QueuePublisher};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared producer handle; cheap to clone.
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    /// Builds a producer against the given bootstrap servers.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Publish`] when the client configuration is
    /// rejected.
    pub fn connect(bootstrap_servers: &str) -> Result<Self, QueueError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .set("queue.buffering.max.ms", "5")
            .create()
            .map_err(|e| QueueError::Publish {
                queue: "-".to_string(),
                reason: format!("failed to create producer: {e}"),
            })?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl QueuePublisher for KafkaPublisher {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        let record = FutureRecord::<(), Vec<u8>>::to(queue).payload(&payload);
        self.producer
            .send(record, PUBLISH_TIMEOUT)
            .await
            .map_err(|(e, _)| QueueError::Publish {
                queue: queue.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Consumer subscribed to one topic.
///
/// `recv` only records the delivered offset; the commit happens in `ack`
/// once the caller's downstream publish or store write has succeeded. A
/// crash between the two leaves the offset uncommitted and the message is
/// redelivered ("prefer duplicates to loss").
pub struct KafkaQueueConsumer {
    consumer: StreamConsumer,
    queue: String,
    /// Partition and offset of the last delivered, not-yet-acked message.
    outstanding: Mutex<Option<(i32, i64)>>,
}

impl KafkaQueueConsumer {
    /// Subscribes a new consumer in `group_id` to `queue`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Receive`] when the client cannot be built or the
    /// subscription is rejected.
    pub fn connect(
        bootstrap_servers: &str,
        group_id: &str,
        queue: &str,
    ) -> Result<Self, QueueError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .create()
            .map_err(|e| QueueError::Receive(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[queue])
            .map_err(|e| QueueError::Receive(format!("failed to subscribe to {queue}: {e}")))?;

        Ok(Self {
            consumer,
            queue: queue.to_string(),
            outstanding: Mutex::new(None),
        })
    }
}

#[async_trait]
impl QueueConsumer for KafkaQueueConsumer {
    async fn recv(&self) -> Result<Vec<u8>, QueueError> {
        loop {
            let msg = self
                .consumer
                .recv()
                .await
                .map_err(|e| QueueError::Receive(e.to_string()))?;

            match msg.payload() {
                Some(bytes) => {
                    let payload = bytes.to_vec();
                    *self
                        .outstanding
                        .lock()
                        .expect("kafka offset lock poisoned") =
                        Some((msg.partition(), msg.offset()));
                    return Ok(payload);
                }
                // Tombstones carry nothing to process; skip without taking
                // an offset, a redelivery is harmless.
                None => continue,
            }
        }
    }

    async fn ack(&self) -> Result<(), QueueError> {
        let taken = self
            .outstanding
            .lock()
            .expect("kafka offset lock poisoned")
            .take();
        let Some((partition, offset)) = taken else {
            return Ok(());
        };

        // Committed offset is the NEXT message to read.
        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&self.queue, partition, Offset::Offset(offset + 1))
            .map_err(|e| QueueError::Ack(e.to_string()))?;

        self.consumer
            .commit(&assignment, CommitMode::Async)
            .map_err(|e| QueueError::Ack(e.to_string()))
    }
}
