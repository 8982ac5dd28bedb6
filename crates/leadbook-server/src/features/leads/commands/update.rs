//! Update lead command
//!
//! Partially updates a lead. Only the fields present in the request change;
//! the names of those fields are recorded with `LEAD_UPDATED`.

use leadbook_common::Actor;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::create::{validate_optional_fields, MAX_NAME_LENGTH};
use crate::audit::{models::LEAD_UPDATED, AuditRecorder};
use crate::features::leads::types::{Lead, LeadSource, LeadStage, LeadStatus, Priority, LEAD_COLUMNS};
use crate::features::shared::validation::{validate_required, FieldError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadCommand {
    pub lead_name: Option<String>,
    pub institution: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub owner: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub stage: Option<LeadStage>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateLeadError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("Lead with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateLeadCommand {
    /// Wire names of the fields this update touches, in declaration order.
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let present = [
            ("leadName", self.lead_name.is_some()),
            ("institution", self.institution.is_some()),
            ("phoneNumber", self.phone_number.is_some()),
            ("city", self.city.is_some()),
            ("owner", self.owner.is_some()),
            ("email", self.email.is_some()),
            ("notes", self.notes.is_some()),
            ("priority", self.priority.is_some()),
            ("stage", self.stage.is_some()),
            ("status", self.status.is_some()),
            ("source", self.source.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), UpdateLeadError> {
        if self.updated_fields().is_empty() {
            return Err(UpdateLeadError::NoFieldsToUpdate);
        }
        if let Some(name) = &self.lead_name {
            validate_required("leadName", name, MAX_NAME_LENGTH)?;
        }
        validate_optional_fields(
            self.institution.as_deref(),
            self.phone_number.as_deref(),
            self.city.as_deref(),
            self.owner.as_deref(),
            self.email.as_deref(),
            self.notes.as_deref(),
        )?;
        Ok(())
    }

    fn build_update(&self, id: Uuid) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new("UPDATE leads SET ");
        let mut set = builder.separated(", ");

        if let Some(v) = &self.lead_name {
            set.push("lead_name = ").push_bind_unseparated(v.trim());
        }
        for (column, value) in [
            ("institution", &self.institution),
            ("phone_number", &self.phone_number),
            ("city", &self.city),
            ("owner", &self.owner),
            ("email", &self.email),
            ("notes", &self.notes),
        ] {
            if let Some(v) = value {
                set.push(format!("{column} = ")).push_bind_unseparated(v.as_str());
            }
        }
        if let Some(v) = self.priority {
            set.push("priority = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.stage {
            set.push("stage = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.status {
            set.push("status = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.source {
            set.push("source = ").push_bind_unseparated(v.as_str());
        }
        set.push("updated_at = NOW()");

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {LEAD_COLUMNS}"));
        builder
    }
}

#[tracing::instrument(skip(pool, recorder, command), fields(lead_id = %id))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    id: Uuid,
    command: UpdateLeadCommand,
) -> Result<Lead, UpdateLeadError> {
    command.validate()?;

    let lead = command
        .build_update(id)
        .build_query_as::<Lead>()
        .fetch_optional(pool)
        .await?
        .ok_or(UpdateLeadError::NotFound(id))?;

    tracing::info!(lead_id = %lead.id, "Lead updated");

    recorder
        .record_or_log(
            LEAD_UPDATED,
            actor,
            Some(json!({ "leadId": lead.id, "updatedFields": command.updated_fields() })),
        )
        .await;

    Ok(lead)
}
