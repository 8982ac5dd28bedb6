//! Bulk delete call logs command
//!
//! Unknown ids are ignored; the response reports how many rows went away.

use leadbook_common::Actor;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::response::DeletedCount;
use crate::audit::{models::CALL_LOG_BULK_DELETED, AuditRecorder};

/// Upper bound on ids per request.
pub const MAX_BULK_DELETE: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteCallLogsCommand {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum BulkDeleteCallLogsError {
    #[error("ids must contain at least one call log ID")]
    Empty,
    #[error("ids must contain at most {} entries", MAX_BULK_DELETE)]
    TooMany,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BulkDeleteCallLogsCommand {
    pub fn validate(&self) -> Result<(), BulkDeleteCallLogsError> {
        if self.ids.is_empty() {
            return Err(BulkDeleteCallLogsError::Empty);
        }
        if self.ids.len() > MAX_BULK_DELETE {
            return Err(BulkDeleteCallLogsError::TooMany);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, recorder, command), fields(requested = command.ids.len()))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    command: BulkDeleteCallLogsCommand,
) -> Result<DeletedCount, BulkDeleteCallLogsError> {
    command.validate()?;

    let result = sqlx::query("DELETE FROM call_logs WHERE id = ANY($1)")
        .bind(&command.ids)
        .execute(pool)
        .await?;
    let deleted = result.rows_affected();

    tracing::info!(deleted, "Call logs bulk deleted");

    recorder
        .record_or_log(
            CALL_LOG_BULK_DELETED,
            actor,
            Some(json!({ "count": deleted, "ids": command.ids })),
        )
        .await;

    Ok(DeletedCount { deleted })
}
