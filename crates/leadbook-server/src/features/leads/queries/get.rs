//! Get lead query

use sqlx::PgPool;
use uuid::Uuid;

use crate::features::leads::types::{Lead, LEAD_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum GetLeadError {
    #[error("Lead with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: &PgPool, id: Uuid) -> Result<Lead, GetLeadError> {
    sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(GetLeadError::NotFound(id))
}
