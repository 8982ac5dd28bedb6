//! Audit recorder
//!
//! Producer side of the audit pipeline. Builds an [`AuditJob`] and submits it
//! under [`LOG_ACTION_JOB`]; it never touches the log store. Callers await the
//! submission only, not the write.

use std::sync::Arc;

use leadbook_common::audit_job::{Actor, AuditJob, LOG_ACTION_JOB};
use serde_json::Value as JsonValue;
use tracing::{debug, error};

use crate::queue::{JobHandle, QueueError, TaskQueue};

#[derive(Clone)]
pub struct AuditRecorder {
    queue: Arc<dyn TaskQueue>,
}

impl AuditRecorder {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// Enqueues one audit event stamped with the current instant.
    pub async fn record(
        &self,
        action: &str,
        actor: Actor,
        details: Option<JsonValue>,
    ) -> Result<JobHandle, QueueError> {
        let job = AuditJob::new(action, actor, details);
        let payload = job.to_payload().map_err(|e| QueueError::Encode(e.to_string()))?;

        let handle = self.queue.submit(LOG_ACTION_JOB, payload).await?;
        debug!(job_id = %handle.id, action, "Audit event enqueued");
        Ok(handle)
    }

    /// Like [`record`](Self::record), but a failed enqueue is logged and dropped.
    pub async fn record_or_log(&self, action: &str, actor: Actor, details: Option<JsonValue>) {
        if let Err(e) = self.record(action, actor, details).await {
            error!(action, error = %e, "Failed to enqueue audit event");
        }
    }
}
