//! Durable log store access
//!
//! [`AuditLogStore`] is the narrow repository seam over the `audit_log` table.
//! [`AuditLog`] wraps a store and owns the failure policy: every write failure
//! is logged here and handed back as a typed error, so callers can inspect it
//! but never have to.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use super::models::{AuditFilter, AuditRecord, NewAuditRecord, DEFAULT_AUDIT_QUERY_LIMIT};

#[derive(Debug, Error)]
pub enum AuditStoreError {
    #[error("Audit store database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Audit store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn insert(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditStoreError>;

    /// Newest first, windowed by `limit`/`offset`, optionally one action only.
    async fn find_all(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError>;

    async fn find_by_actor(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditRecord>, AuditStoreError>;

    async fn count_by_action(&self, action: &str) -> Result<i64, AuditStoreError>;

    /// Deletes every record with `created_at` strictly before `cutoff`.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError>;
}

/// Audit log service used by the worker, the sweeper, and the read API.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditLogStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Persists one record. Never panics; a failure is logged and returned.
    pub async fn create_log(&self, data: NewAuditRecord) -> Result<AuditRecord, AuditStoreError> {
        let action = data.action.clone();
        match self.store.insert(data).await {
            Ok(record) => {
                debug!(audit_id = %record.id, action = %record.action, "Audit record persisted");
                Ok(record)
            },
            Err(e) => {
                error!(action = %action, error = %e, "Failed to create audit log");
                Err(e)
            },
        }
    }

    pub async fn find_all(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>, AuditStoreError> {
        self.store.find_all(&filter.normalized()).await
    }

    pub async fn find_by_actor(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<AuditRecord>, AuditStoreError> {
        let limit = AuditFilter {
            limit: limit.unwrap_or(DEFAULT_AUDIT_QUERY_LIMIT),
            ..AuditFilter::default()
        }
        .normalized()
        .limit;
        self.store.find_by_actor(user_id, limit).await
    }

    pub async fn count_by_action(&self, action: &str) -> Result<i64, AuditStoreError> {
        self.store.count_by_action(action).await
    }

    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditStoreError> {
        let deleted = self.store.delete_older_than(cutoff).await?;
        info!(deleted, cutoff = %cutoff, "Deleted expired audit records");
        Ok(deleted)
    }
}
