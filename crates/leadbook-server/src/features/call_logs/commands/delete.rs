//! Delete call log command

use leadbook_common::Actor;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{models::CALL_LOG_DELETED, AuditRecorder};
use crate::features::call_logs::types::{CallLog, CALL_LOG_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum DeleteCallLogError {
    #[error("Call log with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, recorder), fields(call_log_id = %id))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    id: Uuid,
) -> Result<CallLog, DeleteCallLogError> {
    let call_log = sqlx::query_as::<_, CallLog>(&format!(
        "DELETE FROM call_logs WHERE id = $1 RETURNING {CALL_LOG_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DeleteCallLogError::NotFound(id))?;

    tracing::info!(call_log_id = %call_log.id, "Call log deleted");

    recorder
        .record_or_log(
            CALL_LOG_DELETED,
            actor,
            Some(json!({
                "callLogId": call_log.id,
                "phoneNumber": call_log.phone_number,
                "name": call_log.name,
            })),
        )
        .await;

    Ok(call_log)
}
