//! In-process audit log store, used with the in-memory queue and in tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{AuditFilter, AuditRecord, NewAuditRecord};
use super::store::{AuditLogStore, AuditStoreError};

#[derive(Clone, Default)]
pub struct MemoryAuditLogStore {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts with an explicit `created_at`, e.g. to backdate a record.
    pub fn insert_at(&self, record: NewAuditRecord, created_at: DateTime<Utc>) -> AuditRecord {
        let stored = AuditRecord {
            id: Uuid::new_v4(),
            action: record.action,
            method: record.method,
            url: record.url,
            status_code: record.status_code,
            duration: record.duration,
            ip: record.ip,
            user_agent: record.user_agent,
            details: record.details,
            user_id: record.user_id,
            created_at,
        };
        self.lock().push(stored.clone());
        stored
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Matching records, newest first.
    fn sorted<F>(&self, keep: F) -> Vec<AuditRecord>
    where
        F: Fn(&AuditRecord) -> bool,
    {
        let mut rows: Vec<AuditRecord> = self.lock().iter().filter(|r| keep(r)).cloned().collect();
        // Stable sort keeps later inserts first among equal timestamps.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

fn window(rows: Vec<AuditRecord>, offset: i64, limit: i64) -> Vec<AuditRecord> {
    rows.into_iter()
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl AuditLogStore for MemoryAuditLogStore {
    async fn insert(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditStoreError> {
        Ok(self.insert_at(record, Utc::now()))
    }

    async fn find_all(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let rows = self.sorted(|r| filter.action.as_ref().is_none_or(|a| &r.action == a));
        Ok(window(rows, filter.offset, filter.limit))
    }

    async fn find_by_actor(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let rows = self.sorted(|r| r.user_id.as_deref() == Some(user_id));
        Ok(window(rows, 0, limit))
    }

    async fn count_by_action(&self, action: &str) -> Result<i64, AuditStoreError> {
        let count = self.lock().iter().filter(|r| r.action == action).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}
