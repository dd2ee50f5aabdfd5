//! Infrastructure layer: cache, broker transport, storage, and external
//! service clients.

pub mod cache;
pub mod persistence;
pub mod probes;
pub mod queue;
