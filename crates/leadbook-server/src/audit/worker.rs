//! Background audit worker
//!
//! Long-running consumer of the audit queue. Each consumer task handles one
//! job at a time; several tasks (and several processes) may drain the same
//! queue. Every delivered job is completed, whatever its outcome, so a bad
//! payload or a failed write is never redelivered. Only a job whose consumer
//! died mid-flight comes back, after its lease expires. That can produce a
//! duplicate record, which is acceptable.

use std::sync::Arc;
use std::time::Duration;

use leadbook_common::audit_job::{AuditJob, LOG_ACTION_JOB};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::models::NewAuditRecord;
use super::store::AuditLog;
use crate::queue::{Delivery, QueueError, TaskQueue};

/// What happened to one delivered job. Every variant counts as success for
/// the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Record written with this id.
    Persisted(Uuid),
    /// The store rejected the write; already logged by the store call.
    PersistFailed,
    /// Payload could not be decoded.
    Malformed,
    /// No handler for this job name.
    UnknownJob,
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub concurrency: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            concurrency: crate::config::DEFAULT_WORKER_CONCURRENCY,
            poll_interval: Duration::from_millis(crate::config::DEFAULT_QUEUE_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Clone)]
pub struct AuditWorker {
    queue: Arc<dyn TaskQueue>,
    log: AuditLog,
    options: WorkerOptions,
}

impl AuditWorker {
    pub fn new(queue: Arc<dyn TaskQueue>, log: AuditLog, options: WorkerOptions) -> Self {
        Self {
            queue,
            log,
            options,
        }
    }

    /// Dispatches one delivery by job name.
    pub async fn process(&self, delivery: &Delivery) -> JobOutcome {
        match delivery.name.as_str() {
            LOG_ACTION_JOB => self.handle_log_action(delivery).await,
            other => {
                warn!(job_id = %delivery.id, job_name = other, "Unknown job name, acknowledging without processing");
                JobOutcome::UnknownJob
            },
        }
    }

    async fn handle_log_action(&self, delivery: &Delivery) -> JobOutcome {
        let job = match AuditJob::from_payload(&delivery.payload) {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %delivery.id, error = %e, "Discarding undecodable audit job");
                return JobOutcome::Malformed;
            },
        };

        debug!(
            job_id = %delivery.id,
            action = %job.action,
            actor = %job.user_id,
            attempt = delivery.attempts,
            "Processing audit job"
        );

        let record = NewAuditRecord::from_details(
            job.action,
            job.user_id.user_id().map(str::to_string),
            job.details,
        );

        match self.log.create_log(record).await {
            Ok(stored) => JobOutcome::Persisted(stored.id),
            Err(_) => JobOutcome::PersistFailed,
        }
    }

    /// Reserves, processes and completes at most one job. Returns the outcome,
    /// or `None` when the queue was empty.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>, QueueError> {
        let Some(delivery) = self.queue.reserve().await? else {
            return Ok(None);
        };

        let outcome = self.process(&delivery).await;
        self.queue.complete(delivery.id).await?;
        Ok(Some(outcome))
    }

    /// Drains until the queue is empty. Returns the number of jobs handled.
    pub async fn drain(&self) -> Result<usize, QueueError> {
        let mut handled = 0;
        while self.run_once().await?.is_some() {
            handled += 1;
        }
        Ok(handled)
    }

    async fn consume(self, consumer: usize, cancel: CancellationToken) {
        info!(consumer, "Audit consumer started");
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let idle = match self.run_once().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    error!(consumer, error = %e, "Audit consumer failed to talk to the queue");
                    true
                },
            };

            if idle {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.options.poll_interval) => {},
                }
            }
        }
        info!(consumer, "Audit consumer stopped");
    }

    /// Spawns `concurrency` consumer tasks that run until `cancel` fires.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        (0..self.options.concurrency.max(1))
            .map(|consumer| {
                let worker = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(
                    worker
                        .consume(consumer, cancel)
                        .instrument(tracing::info_span!("audit_consumer", consumer)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::memory::MemoryAuditLogStore;
    use crate::audit::models::AuditFilter;
    use crate::queue::MemoryTaskQueue;
    use serde_json::json;

    fn setup() -> (MemoryTaskQueue, MemoryAuditLogStore, AuditWorker) {
        let queue = MemoryTaskQueue::default();
        let store = MemoryAuditLogStore::new();
        let worker = AuditWorker::new(
            Arc::new(queue.clone()),
            AuditLog::new(Arc::new(store.clone())),
            WorkerOptions::default(),
        );
        (queue, store, worker)
    }

    #[tokio::test]
    async fn test_unknown_job_is_completed_without_write() {
        let (queue, store, worker) = setup();
        queue.submit("send-email", json!({"to": "x"})).await.unwrap();

        let outcome = worker.run_once().await.unwrap();

        assert_eq!(outcome, Some(JobOutcome::UnknownJob));
        assert!(store.is_empty());
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_completed_without_write() {
        let (queue, store, worker) = setup();
        queue.submit("log-action", json!({"nope": true})).await.unwrap();

        assert_eq!(worker.run_once().await.unwrap(), Some(JobOutcome::Malformed));
        assert!(store.is_empty());
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_log_action_maps_system_to_null_actor() {
        let (queue, store, worker) = setup();
        queue
            .submit(
                "log-action",
                json!({
                    "action": "HTTP_REQUEST",
                    "userId": "SYSTEM",
                    "details": {"method": "POST", "statusCode": 201},
                    "timestamp": "2025-01-01T00:00:00.000Z"
                }),
            )
            .await
            .unwrap();

        let outcome = worker.run_once().await.unwrap();
        assert!(matches!(outcome, Some(JobOutcome::Persisted(_))));

        let records = AuditLog::new(Arc::new(store.clone()))
            .find_all(Default::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, None);
        assert_eq!(records[0].method.as_deref(), Some("POST"));
        assert_eq!(records[0].status_code, Some(201));
    }

    #[tokio::test]
    async fn test_unstamped_log_action_is_persisted() {
        let (queue, store, worker) = setup();
        queue
            .submit(
                "log-action",
                json!({"action": "LEAD_CREATED", "userId": "u1", "details": {"leadId": "l1"}}),
            )
            .await
            .unwrap();

        let outcome = worker.run_once().await.unwrap();
        assert!(matches!(outcome, Some(JobOutcome::Persisted(_))));

        let records = AuditLog::new(Arc::new(store.clone()))
            .find_all(AuditFilter::action("LEAD_CREATED"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id.as_deref(), Some("u1"));
        assert_eq!(records[0].details, Some(json!({"leadId": "l1"})));
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_run_once_on_empty_queue() {
        let (_queue, _store, worker) = setup();
        assert_eq!(worker.run_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_spawned_consumers_stop_on_cancel() {
        let (queue, store, worker) = setup();
        for i in 0..3 {
            queue
                .submit(
                    "log-action",
                    json!({"action": "TICK", "details": {"i": i}, "timestamp": "2025-01-01T00:00:00.000Z"}),
                )
                .await
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let handles = worker.spawn(cancel.clone());

        for _ in 0..100 {
            if store.len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 3);
        assert!(queue.jobs().is_empty());
    }
}
