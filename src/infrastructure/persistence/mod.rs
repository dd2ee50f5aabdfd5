//! Storage implementations of the domain repository traits.

mod memory_aggregate_store;
mod memory_click_repository;
mod memory_job_store;
mod pg_click_repository;
mod redis_aggregate_store;
mod redis_job_store;

pub use memory_aggregate_store::InMemoryAggregateStore;
pub use memory_click_repository::InMemoryClickRepository;
pub use memory_job_store::InMemoryJobStore;
pub use pg_click_repository::PgClickRepository;
pub use redis_aggregate_store::RedisAggregateStore;
pub use redis_job_store::RedisJobStore;
