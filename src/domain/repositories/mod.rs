//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; concrete implementations
//! live in `crate::infrastructure::persistence`. Mock implementations are
//! auto-generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`JobStore`] - authoritative validation job state
//! - [`ClickRepository`] - enriched per-click records
//! - [`AggregateStore`] - per-URL and system-wide click counters

pub mod aggregate_store;
pub mod click_repository;
pub mod job_store;

pub use aggregate_store::AggregateStore;
pub use click_repository::ClickRepository;
pub use job_store::{JobStore, StatusUpdate};

#[cfg(test)]
pub use aggregate_store::MockAggregateStore;
#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use job_store::MockJobStore;
