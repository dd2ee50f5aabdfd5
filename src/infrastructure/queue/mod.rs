//! Work and result queue transport.
//!
//! The pipeline talks to the broker through [`QueuePublisher`] and
//! [`QueueConsumer`]; [`KafkaPublisher`]/[`KafkaQueueConsumer`] back
//! production deployments and [`MemoryQueue`] backs tests and single-process
//! runs.

mod kafka_queue;
mod memory_queue;
mod service;

pub use kafka_queue::{KafkaPublisher, KafkaQueueConsumer};
pub use memory_queue::{MemoryQueue, MemoryQueueConsumer};
pub use service::{QueueConsumer, QueueError, QueuePublisher};

#[cfg(test)]
pub use service::MockQueuePublisher;
