//! In-memory task record store.
//!
//! The [`TaskStore`] keeps task records ordered by [`RecordId`] and allocates
//! ids from a counter held under the same lock as the records, so a record
//! with a higher id was always created later.

use std::collections::BTreeMap;

use tasksync_proto::task::{RecordId, TaskRecord, UpdateTaskRequest};
use tokio::sync::RwLock;

/// Errors returned by store lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record exists with the given id.
    #[error("task {0} not found")]
    NotFound(RecordId),
}

/// Records plus the next id to hand out.
#[derive(Debug)]
struct Records {
    by_id: BTreeMap<RecordId, TaskRecord>,
    next_id: u64,
}

/// Task collection keyed by permanent id.
///
/// Thread-safe via [`RwLock`]. Reads (single lookups and range scans) take
/// the read lock; create, update and delete take the write lock.
#[derive(Debug)]
pub struct TaskStore {
    records: RwLock<Records>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store. The first record gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records {
                by_id: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Inserts a new, incomplete task and returns it with its assigned id.
    pub async fn create(&self, text: String) -> TaskRecord {
        let mut records = self.records.write().await;
        let id = RecordId::new(records.next_id);
        records.next_id += 1;
        let record = TaskRecord {
            id,
            text,
            is_complete: false,
        };
        records.by_id.insert(id, record.clone());
        drop(records);
        record
    }

    /// Returns the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such record exists.
    pub async fn get(&self, id: RecordId) -> Result<TaskRecord, StoreError> {
        let records = self.records.read().await;
        records.by_id.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    /// Applies the present fields of `patch` to a record (last writer wins).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such record exists.
    pub async fn update(
        &self,
        id: RecordId,
        patch: &UpdateTaskRequest,
    ) -> Result<TaskRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(text) = &patch.text {
            record.text.clone_from(text);
        }
        if let Some(is_complete) = patch.is_complete {
            record.is_complete = is_complete;
        }
        Ok(record.clone())
    }

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such record exists.
    pub async fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    /// Returns up to `limit` records in descending id order, starting at
    /// `boundary` (inclusive) or at the newest record when `boundary` is
    /// `None`.
    pub async fn range_desc(&self, boundary: Option<RecordId>, limit: usize) -> Vec<TaskRecord> {
        let records = self.records.read().await;
        let upper = boundary.unwrap_or(RecordId::new(u64::MAX));
        records
            .by_id
            .range(..=upper)
            .rev()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_id.is_empty()
    }
}
