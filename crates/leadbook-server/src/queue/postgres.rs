//! Postgres-backed task queue

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Delivery, DeliveryPolicy, JobHandle, QueueError, TaskQueue};

/// Queue over the `task_queue` table, scoped to one named channel.
///
/// Rows are `pending` until completed (deleted) or parked as `dead` after
/// `max_attempts` deliveries. A claim bumps `attempts` and sets `locked_until`;
/// while the lease holds no other consumer sees the row.
#[derive(Clone)]
pub struct PgTaskQueue {
    pool: PgPool,
    queue: String,
    policy: DeliveryPolicy,
}

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    id: Uuid,
    job_name: String,
    payload: JsonValue,
    attempts: i32,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool, queue: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            pool,
            queue: queue.into(),
            policy,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    /// Parks jobs whose last lease expired after their final attempt.
    async fn bury_exhausted(&self) -> Result<u64, QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE task_queue
            SET status = 'dead', locked_until = NULL, updated_at = NOW()
            WHERE queue = $1
              AND status = 'pending'
              AND locked_until < NOW()
              AND attempts >= max_attempts
            "#,
        )
        .bind(&self.queue)
        .execute(&self.pool)
        .await?;

        let buried = result.rows_affected();
        if buried > 0 {
            warn!(queue = %self.queue, buried, "Moved exhausted jobs to dead state");
        }
        Ok(buried)
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn submit(&self, name: &str, payload: JsonValue) -> Result<JobHandle, QueueError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO task_queue (queue, job_name, payload, max_attempts)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&self.queue)
        .bind(name)
        .bind(&payload)
        .bind(self.policy.max_attempts)
        .fetch_one(&self.pool)
        .await?;

        debug!(job_id = %id, job_name = name, queue = %self.queue, "Job submitted");

        Ok(JobHandle {
            id,
            name: name.to_string(),
        })
    }

    async fn reserve(&self) -> Result<Option<Delivery>, QueueError> {
        self.bury_exhausted().await?;

        let claimed = sqlx::query_as::<_, ClaimedRow>(
            r#"
            UPDATE task_queue
            SET attempts = attempts + 1,
                locked_until = NOW() + make_interval(secs => $2),
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM task_queue
                WHERE queue = $1
                  AND status = 'pending'
                  AND attempts < max_attempts
                  AND (locked_until IS NULL OR locked_until < NOW())
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, job_name, payload, attempts
            "#,
        )
        .bind(&self.queue)
        .bind(self.policy.visibility_timeout.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(claimed.map(|row| Delivery {
            id: row.id,
            name: row.job_name,
            payload: row.payload,
            attempts: row.attempts,
        }))
    }

    async fn complete(&self, id: Uuid) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM task_queue WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(job_id = %id, queue = %self.queue, "Job completed");
        Ok(())
    }
}
