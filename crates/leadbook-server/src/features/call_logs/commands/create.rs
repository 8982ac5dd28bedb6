//! Create call log command

use chrono::{DateTime, Utc};
use leadbook_common::Actor;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::audit::{models::CALL_LOG_CREATED, AuditRecorder};
use crate::features::call_logs::types::{CallLog, CallType, SimProvider, CALL_LOG_COLUMNS};
use crate::features::shared::validation::{
    validate_email, validate_length, validate_non_negative, validate_phone, validate_required,
    FieldError,
};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_NOTES_LENGTH: usize = 5000;

/// Command to record a call
///
/// `callTime` defaults to now, `duration` to 0 and `simProvider` to `OTHER`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallLogCommand {
    pub name: String,
    pub phone_number: String,
    pub call_type: CallType,
    pub duration: Option<i32>,
    pub sim_provider: Option<SimProvider>,
    pub user_email: String,
    pub call_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateCallLogError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateCallLogCommand {
    pub fn validate(&self) -> Result<(), CreateCallLogError> {
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_phone("phoneNumber", &self.phone_number)?;
        validate_email("userEmail", &self.user_email)?;
        if let Some(duration) = self.duration {
            validate_non_negative("duration", duration)?;
        }
        if let Some(notes) = &self.notes {
            validate_length("notes", notes, MAX_NOTES_LENGTH)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, recorder, command), fields(call_type = %command.call_type))]
pub async fn handle(
    pool: &PgPool,
    recorder: &AuditRecorder,
    actor: Actor,
    command: CreateCallLogCommand,
) -> Result<CallLog, CreateCallLogError> {
    command.validate()?;

    let call_log = sqlx::query_as::<_, CallLog>(&format!(
        "INSERT INTO call_logs (name, phone_number, call_type, duration, sim_provider, \
         user_email, call_time, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {CALL_LOG_COLUMNS}"
    ))
    .bind(command.name.trim())
    .bind(&command.phone_number)
    .bind(command.call_type.as_str())
    .bind(command.duration.unwrap_or(0))
    .bind(command.sim_provider.unwrap_or_default().as_str())
    .bind(&command.user_email)
    .bind(command.call_time.unwrap_or_else(Utc::now))
    .bind(&command.notes)
    .fetch_one(pool)
    .await?;

    tracing::info!(call_log_id = %call_log.id, "Call log created");

    recorder
        .record_or_log(
            CALL_LOG_CREATED,
            actor,
            Some(json!({
                "callLogId": call_log.id,
                "phoneNumber": call_log.phone_number,
                "name": call_log.name,
                "callType": call_log.call_type,
                "userEmail": call_log.user_email,
            })),
        )
        .await;

    Ok(call_log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryTaskQueue;
    use std::sync::Arc;

    fn command() -> CreateCallLogCommand {
        CreateCallLogCommand {
            name: "Gaurav Mishra".into(),
            phone_number: "+91 99122 33445".into(),
            call_type: CallType::Outgoing,
            duration: Some(536),
            sim_provider: Some(SimProvider::Vi),
            user_email: "admin@unite.com".into(),
            call_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_validation() {
        assert!(command().validate().is_ok());

        let mut bad_phone = command();
        bad_phone.phone_number = "99-ABC".into();
        assert!(matches!(
            bad_phone.validate(),
            Err(CreateCallLogError::Validation(FieldError::InvalidPhone { .. }))
        ));

        let mut negative = command();
        negative.duration = Some(-5);
        assert!(negative.validate().is_err());

        let mut bad_email = command();
        bad_email.user_email = "admin".into();
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_call_type_is_required() {
        let result = serde_json::from_value::<CreateCallLogCommand>(json!({
            "name": "Anita Rao",
            "phoneNumber": "9998887776",
            "userEmail": "sales@unite.com"
        }));
        assert!(result.is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_applies_defaults(pool: PgPool) -> sqlx::Result<()> {
        let queue = MemoryTaskQueue::default();
        let recorder = AuditRecorder::new(Arc::new(queue.clone()));
        let mut cmd = command();
        cmd.duration = None;
        cmd.sim_provider = None;

        let before = Utc::now();
        let log = handle(&pool, &recorder, Actor::user("user_2"), cmd).await.unwrap();
        assert_eq!(log.duration, 0);
        assert_eq!(log.sim_provider, SimProvider::Other);
        assert!(log.call_time >= before - chrono::Duration::seconds(1));

        let jobs = queue.jobs();
        assert_eq!(jobs[0].payload["action"], "CALL_LOG_CREATED");
        assert_eq!(jobs[0].payload["details"]["callType"], "OUTGOING");
        Ok(())
    }
}
