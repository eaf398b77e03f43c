use std::sync::Mutex;

use breaker_core::contract::FailureRecord;
use breaker_core::window::count_active;

use crate::error::StoreError;

/// Shared failure-record store. The gate only counts; the recorder only inserts.
pub trait FailureStore {
    /// Number of records for `resource` whose expiration time is after `now`.
    fn count_active(&self, resource: &str, now: i64) -> Result<u64, StoreError>;

    fn insert(&self, record: &FailureRecord) -> Result<(), StoreError>;
}

/// Process-local store that never purges, so expired records stay visible to
/// the window predicate.
#[derive(Debug, Default)]
pub struct InMemoryFailureStore {
    records: Mutex<Vec<FailureRecord>>,
}

impl InMemoryFailureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.lock().map(|records| records.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<FailureRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Query("in-memory store mutex poisoned".to_string()))
    }
}

impl FailureStore for InMemoryFailureStore {
    fn count_active(&self, resource: &str, now: i64) -> Result<u64, StoreError> {
        let records = self.lock()?;
        Ok(count_active(records.iter(), resource, now))
    }

    fn insert(&self, record: &FailureRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Write("in-memory store mutex poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
