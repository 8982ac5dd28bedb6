//! Get call log query

use sqlx::PgPool;
use uuid::Uuid;

use crate::features::call_logs::types::{CallLog, CALL_LOG_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum GetCallLogError {
    #[error("Call log with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, id: Uuid) -> Result<CallLog, GetCallLogError> {
    sqlx::query_as::<_, CallLog>(&format!(
        "SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(GetCallLogError::NotFound(id))
}
