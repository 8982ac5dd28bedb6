//! Update call log command

use chrono::{DateTime, Utc};
use leadbook_common::Actor;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::create::{MAX_NAME_LENGTH, MAX_NOTES_LENGTH};
use crate::audit::{models::CALL_LOG_UPDATED, AuditRecorder};
use crate::features::call_logs::types::{CallLog, CallType, SimProvider, CALL_LOG_COLUMNS};
use crate::features::shared::validation::{
    validate_email, validate_length, validate_non_negative, validate_phone, validate_required,
    FieldError,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCallLogCommand {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub call_type: Option<CallType>,
    pub duration: Option<i32>,
    pub sim_provider: Option<SimProvider>,
    pub user_email: Option<String>,
    pub call_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateCallLogError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("Call log with ID {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateCallLogCommand {
    pub fn updated_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("phoneNumber", self.phone_number.is_some()),
            ("callType", self.call_type.is_some()),
            ("duration", self.duration.is_some()),
            ("simProvider", self.sim_provider.is_some()),
            ("userEmail", self.user_email.is_some()),
            ("callTime", self.call_time.is_some()),
            ("notes", self.notes.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    pub fn validate(&self) -> Result<(), UpdateCallLogError> {
        if self.updated_fields().is_empty() {
            return Err(UpdateCallLogError::NoFieldsToUpdate);
        }
        if let Some(name) = &self.name {
            validate_required("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(phone) = &self.phone_number {
            validate_phone("phoneNumber", phone)?;
        }
        if let Some(email) = &self.user_email {
            validate_email("userEmail", email)?;
        }
        if let Some(duration) = self.duration {
            validate_non_negative("duration", duration)?;
        }
        if let Some(notes) = &self.notes {
            validate_length("notes", notes, MAX_NOTES_LENGTH)?;
        }
        Ok(())
    }

    fn build_update(&self, id: Uuid) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::new("UPDATE call_logs SET ");
        let mut set = builder.separated(", ");

        if let Some(v) = &self.name {
            set.push("name = ").push_bind_unseparated(v.trim());
        }
        if let Some(v) = &self.phone_number {
            set.push("phone_number = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.call_type {
            set.push("call_type = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.duration {
            set.push("duration = ").push_bind_unseparated(v);
        }
        if let Some(v) = self.sim_provider {
            set.push("sim_provider = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = &self.user_email {
            set.push("user_email = ").push_bind_unseparated(v.as_str());
        }
        if let Some(v) = self.call_time {
            set.push("call_time = ").push_bind_unseparated(v);
        }
        if let Some(v) = &self.notes {
            set.push("notes = ").push_bind_unseparated(v.as_str());
        }
        set.push("updated_at = NOW()");

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {CALL_LOG_COLUMNS}"));
        builder
    }
}

#[tracing::instrument(skip(pool, recorder, command), fields(call_log_id = %id))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    id: Uuid,
    command: UpdateCallLogCommand,
) -> Result<CallLog, UpdateCallLogError> {
    command.validate()?;

    let call_log = command
        .build_update(id)
        .build_query_as::<CallLog>()
        .fetch_optional(pool)
        .await?
        .ok_or(UpdateCallLogError::NotFound(id))?;

    tracing::info!(call_log_id = %call_log.id, "Call log updated");

    recorder
        .record_or_log(
            CALL_LOG_UPDATED,
            actor,
            Some(json!({
                "callLogId": call_log.id,
                "updatedFields": command.updated_fields(),
            })),
        )
        .await;

    Ok(call_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_rejected() {
        assert!(matches!(
            UpdateCallLogCommand::default().validate(),
            Err(UpdateCallLogError::NoFieldsToUpdate)
        ));
    }

    #[test]
    fn test_partial_update() {
        let command: UpdateCallLogCommand = serde_json::from_value(json!({
            "duration": 120,
            "notes": "Asked for a callback"
        }))
        .unwrap();
        assert!(command.validate().is_ok());
        assert_eq!(command.updated_fields(), vec!["duration", "notes"]);

        let builder = command.build_update(Uuid::nil());
        assert!(builder
            .sql()
            .starts_with("UPDATE call_logs SET duration = $1, notes = $2, updated_at = NOW() WHERE id = $3"));
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let command = UpdateCallLogCommand {
            phone_number: Some("phone".into()),
            ..Default::default()
        };
        assert!(matches!(command.validate(), Err(UpdateCallLogError::Validation(_))));
    }
}
