//! Create lead command

use leadbook_common::Actor;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::audit::{models::LEAD_CREATED, AuditRecorder};
use crate::features::leads::types::{Lead, LeadSource, LeadStage, LeadStatus, Priority, LEAD_COLUMNS};
use crate::features::shared::validation::{
    validate_email, validate_length, validate_phone, validate_required, FieldError,
};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_NOTES_LENGTH: usize = 5000;

/// Command to create a new lead
///
/// Only `leadName` is required. Enumerations fall back to their defaults
/// (`MEDIUM`, `CALL_DONE`, `NEW`, `WEBSITE`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadCommand {
    pub lead_name: String,
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
pub enum CreateLeadError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateLeadCommand {
    pub fn validate(&self) -> Result<(), CreateLeadError> {
        validate_required("leadName", &self.lead_name, MAX_NAME_LENGTH)?;
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
}

/// Checks shared by create and update for the free-text lead fields.
pub(crate) fn validate_optional_fields(
    institution: Option<&str>,
    phone_number: Option<&str>,
    city: Option<&str>,
    owner: Option<&str>,
    email: Option<&str>,
    notes: Option<&str>,
) -> Result<(), FieldError> {
    if let Some(institution) = institution {
        validate_length("institution", institution, MAX_NAME_LENGTH)?;
    }
    if let Some(phone) = phone_number.filter(|p| !p.is_empty()) {
        validate_phone("phoneNumber", phone)?;
    }
    if let Some(city) = city {
        validate_length("city", city, MAX_NAME_LENGTH)?;
    }
    if let Some(owner) = owner {
        validate_length("owner", owner, MAX_NAME_LENGTH)?;
    }
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        validate_email("email", email)?;
    }
    if let Some(notes) = notes {
        validate_length("notes", notes, MAX_NOTES_LENGTH)?;
    }
    Ok(())
}

/// Inserts the lead and records `LEAD_CREATED` for `actor`.
#[tracing::instrument(skip(pool, recorder, command), fields(lead_name = %command.lead_name))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    command: CreateLeadCommand,
) -> Result<Lead, CreateLeadError> {
    command.validate()?;

    let sql = format!(
        "INSERT INTO leads (lead_name, institution, phone_number, city, owner, email, notes, \
         priority, stage, status, source) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {LEAD_COLUMNS}"
    );

    let lead = sqlx::query_as::<_, Lead>(&sql)
        .bind(command.lead_name.trim())
        .bind(&command.institution)
        .bind(&command.phone_number)
        .bind(&command.city)
        .bind(&command.owner)
        .bind(&command.email)
        .bind(&command.notes)
        .bind(command.priority.unwrap_or_default().as_str())
        .bind(command.stage.unwrap_or_default().as_str())
        .bind(command.status.unwrap_or_default().as_str())
        .bind(command.source.unwrap_or_default().as_str())
        .fetch_one(pool)
        .await?;

    tracing::info!(lead_id = %lead.id, "Lead created");

    recorder
        .record_or_log(
            LEAD_CREATED,
            actor,
            Some(json!({ "leadId": lead.id, "leadName": lead.lead_name })),
        )
        .await;

    Ok(lead)
}
