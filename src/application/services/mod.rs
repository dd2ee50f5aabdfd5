//! Pipeline services: orchestration, workers, and the result sink.

pub mod geo_processor;
pub mod orchestrator;
pub mod result_sink;
pub mod validation_worker;

pub use geo_processor::{GeoProcessor, UNKNOWN_COUNTRY};
pub use orchestrator::ValidationOrchestrator;
pub use result_sink::ResultSink;
pub use validation_worker::ValidationWorker;
