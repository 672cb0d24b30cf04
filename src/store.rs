//! Persistence boundary for processed records.

use async_trait::async_trait;
use audiohook_common::{FlatRecord, JobToken, Result};
use dashmap::DashMap;

/// Keeps the flat record produced for each job.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, token: JobToken, record: FlatRecord) -> Result<()>;

    async fn get(&self, token: JobToken) -> Option<FlatRecord>;
}

/// In-process store backed by a concurrent map.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<JobToken, FlatRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, token: JobToken, record: FlatRecord) -> Result<()> {
        self.records.insert(token, record);
        Ok(())
    }

    async fn get(&self, token: JobToken) -> Option<FlatRecord> {
        self.records.get(&token).map(|r| r.value().clone())
    }
}
