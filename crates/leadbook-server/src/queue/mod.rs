//! Task queue
//!
//! A persistent, at-least-once job queue. Producers `submit` a named job with a
//! JSON payload and get a [`JobHandle`] back once the queue has accepted it.
//! Consumers `reserve` one job at a time, process it, then `complete` it. A
//! reserved job that is never completed becomes visible again once its lease
//! expires, so every consumer must tolerate duplicate deliveries.
//!
//! Two backends:
//! - [`PgTaskQueue`]: the `task_queue` table, claimed with `FOR UPDATE SKIP LOCKED`.
//!   Shared by the API process and any number of worker processes.
//! - [`MemoryTaskQueue`]: in-process, for embedded workers and tests.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryTaskQueue;
pub use postgres::PgTaskQueue;

/// Returned once the queue has durably accepted a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub id: Uuid,
    pub name: String,
}

/// A job handed to a consumer under lease.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: Uuid,
    pub name: String,
    pub payload: JsonValue,
    /// Delivery count, including this one.
    pub attempts: i32,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode job payload: {0}")]
    Encode(String),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// Lease and dead-letter policy shared by both backends.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub visibility_timeout: std::time::Duration,
    pub max_attempts: i32,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            visibility_timeout: std::time::Duration::from_secs(
                crate::config::DEFAULT_QUEUE_VISIBILITY_TIMEOUT_SECS,
            ),
            max_attempts: crate::config::DEFAULT_QUEUE_MAX_ATTEMPTS,
        }
    }
}

impl From<&crate::config::QueueConfig> for DeliveryPolicy {
    fn from(config: &crate::config::QueueConfig) -> Self {
        Self {
            visibility_timeout: config.visibility_timeout(),
            max_attempts: config.max_attempts,
        }
    }
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Accepts a job. Returns as soon as the job is stored, not when it is processed.
    async fn submit(&self, name: &str, payload: JsonValue) -> Result<JobHandle, QueueError>;

    /// Claims the oldest visible job, if any, under a fresh lease.
    async fn reserve(&self) -> Result<Option<Delivery>, QueueError>;

    /// Acknowledges a delivery. The job is never delivered again.
    async fn complete(&self, id: Uuid) -> Result<(), QueueError>;
}

/// Builds the queue selected by `config`, bound to the audit channel.
pub fn from_config(
    config: &crate::config::QueueConfig,
    pool: sqlx::PgPool,
) -> std::sync::Arc<dyn TaskQueue> {
    let policy = DeliveryPolicy::from(config);
    match config.backend {
        crate::config::QueueBackend::Postgres => std::sync::Arc::new(PgTaskQueue::new(
            pool,
            leadbook_common::audit_job::AUDIT_QUEUE,
            policy,
        )),
        crate::config::QueueBackend::Memory => std::sync::Arc::new(MemoryTaskQueue::new(policy)),
    }
}
