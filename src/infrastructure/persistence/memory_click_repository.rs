//! In-memory click repository for tests and single-process runs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::entities::ClickInfo;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryClickRepository {
    records: Mutex<Vec<ClickInfo>>,
}

impl InMemoryClickRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<ClickInfo> {
        self.records.lock().expect("click records lock poisoned").clone()
    }
}

#[async_trait]
impl ClickRepository for InMemoryClickRepository {
    async fn record(&self, click: ClickInfo) -> Result<(), AppError> {
        self.records
            .lock()
            .expect("click records lock poisoned")
            .push(click);
        Ok(())
    }
}
