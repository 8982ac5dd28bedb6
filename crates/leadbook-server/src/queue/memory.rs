//! In-process task queue
//!
//! Same lease semantics as the Postgres backend, measured on the tokio clock
//! so tests can drive redelivery with `tokio::time::pause`/`advance`. Jobs are
//! lost when the process exits.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Delivery, DeliveryPolicy, JobHandle, QueueError, TaskQueue};

#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: Uuid,
    pub name: String,
    pub payload: JsonValue,
    pub attempts: i32,
    pub dead: bool,
    locked_until: Option<Instant>,
}

#[derive(Clone, Default)]
pub struct MemoryTaskQueue {
    jobs: Arc<Mutex<Vec<QueuedJob>>>,
    policy: DeliveryPolicy,
}

impl MemoryTaskQueue {
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self {
            jobs: Arc::default(),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedJob>> {
        // A panic while holding the lock cannot leave a job half-written.
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every job not yet completed, dead ones included.
    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.lock().clone()
    }

    /// Jobs still eligible for delivery.
    pub fn pending_len(&self) -> usize {
        self.lock().iter().filter(|job| !job.dead).count()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn submit(&self, name: &str, payload: JsonValue) -> Result<JobHandle, QueueError> {
        let id = Uuid::new_v4();
        self.lock().push(QueuedJob {
            id,
            name: name.to_string(),
            payload,
            attempts: 0,
            dead: false,
            locked_until: None,
        });
        debug!(job_id = %id, job_name = name, "Job submitted to in-memory queue");
        Ok(JobHandle {
            id,
            name: name.to_string(),
        })
    }

    async fn reserve(&self) -> Result<Option<Delivery>, QueueError> {
        let now = Instant::now();
        let max_attempts = self.policy.max_attempts;
        let mut jobs = self.lock();

        for job in jobs.iter_mut() {
            if job.dead || job.locked_until.is_some_and(|until| until > now) {
                continue;
            }
            if job.attempts >= max_attempts {
                job.dead = true;
                job.locked_until = None;
                warn!(job_id = %job.id, attempts = job.attempts, "Moved exhausted job to dead state");
                continue;
            }

            job.attempts += 1;
            job.locked_until = Some(now + self.policy.visibility_timeout);
            return Ok(Some(Delivery {
                id: job.id,
                name: job.name.clone(),
                payload: job.payload.clone(),
                attempts: job.attempts,
            }));
        }

        Ok(None)
    }

    async fn complete(&self, id: Uuid) -> Result<(), QueueError> {
        self.lock().retain(|job| job.id != id);
        Ok(())
    }
}
