//! Delete lead command

use leadbook_common::Actor;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{models::LEAD_DELETED, AuditRecorder};
use crate::features::leads::types::{Lead, LEAD_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum DeleteLeadError {
    #[error("Lead with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Deletes the lead and returns it as it was.
#[tracing::instrument(skip(pool, recorder), fields(lead_id = %id))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    id: Uuid,
) -> Result<Lead, DeleteLeadError> {
    let lead = sqlx::query_as::<_, Lead>(&format!(
        "DELETE FROM leads WHERE id = $1 RETURNING {LEAD_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DeleteLeadError::NotFound(id))?;

    tracing::info!(lead_id = %lead.id, "Lead deleted");

    recorder
        .record_or_log(
            LEAD_DELETED,
            actor,
            Some(json!({ "leadId": lead.id, "leadName": lead.lead_name })),
        )
        .await;

    Ok(lead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::leads::commands::create::{self, CreateLeadCommand};
    use crate::queue::MemoryTaskQueue;
    use std::sync::Arc;

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_delete_returns_lead_and_second_delete_is_not_found(
        pool: PgPool,
    ) -> sqlx::Result<()> {
        let queue = MemoryTaskQueue::default();
        let recorder = AuditRecorder::new(Arc::new(queue.clone()));
        let command = CreateLeadCommand {
            lead_name: "Rakesh Kumar".into(),
            ..Default::default()
        };
        let lead = create::handle(&pool, &recorder, Actor::user("u1"), command)
            .await
            .unwrap();

        let deleted = handle(&pool, &recorder, Actor::user("u1"), lead.id).await.unwrap();
        assert_eq!(deleted.id, lead.id);

        let jobs = queue.jobs();
        assert_eq!(jobs[1].payload["action"], "LEAD_DELETED");
        assert_eq!(jobs[1].payload["details"]["leadName"], "Rakesh Kumar");

        assert!(matches!(
            handle(&pool, &recorder, Actor::user("u1"), lead.id).await,
            Err(DeleteLeadError::NotFound(_))
        ));
        Ok(())
    }
}
