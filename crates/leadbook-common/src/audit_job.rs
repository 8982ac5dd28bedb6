//! Audit job wire contract
//!
//! An [`AuditJob`] is the queue-resident form of an audit event: it exists only
//! between enqueue and successful processing by a worker. The JSON layout is
//! camelCase and carries a `schemaVersion` so producers and consumers that are
//! deployed separately can detect drift.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "action": "LEAD_CREATED",
//!   "userId": "user_2abc",
//!   "details": { "leadId": "..." },
//!   "timestamp": "2025-01-18T10:00:00.000Z"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CommonError, Result};

/// Job name under which audit events are submitted.
pub const LOG_ACTION_JOB: &str = "log-action";

/// Queue channel the audit worker consumes.
pub const AUDIT_QUEUE: &str = "audit-logs";

/// Schema version written by this build.
pub const AUDIT_JOB_SCHEMA_VERSION: u32 = 1;

/// Wire sentinel for system-originated events. Never persisted.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Identity an action is attributed to.
///
/// On the wire this is a plain string, with [`SYSTEM_ACTOR`] standing in for
/// [`Actor::System`]. A missing or null `userId` also reads as `System`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Actor {
    System,
    User(String),
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Actor::User(id.into())
    }

    /// The persisted actor id: `None` for system events.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Actor::System => None,
            Actor::User(id) => Some(id),
        }
    }
}

impl From<Option<String>> for Actor {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Actor::System,
            Some(id) if id == SYSTEM_ACTOR || id.is_empty() => Actor::System,
            Some(id) => Actor::User(id),
        }
    }
}

impl From<Actor> for String {
    fn from(actor: Actor) -> Self {
        match actor {
            Actor::System => SYSTEM_ACTOR.to_string(),
            Actor::User(id) => id,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::System => f.write_str(SYSTEM_ACTOR),
            Actor::User(id) => f.write_str(id),
        }
    }
}

/// Serialized audit event travelling through the task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditJob {
    /// Payloads from producers predating versioning carry no field and read as 1.
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    pub action: String,
    #[serde(default = "system_actor")]
    pub user_id: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    /// ISO-8601, millisecond precision, UTC. Set at enqueue time; payloads
    /// from producers that never stamped it still decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

fn legacy_schema_version() -> u32 {
    1
}

fn system_actor() -> Actor {
    Actor::System
}

impl AuditJob {
    /// Builds a job stamped with the current instant.
    pub fn new(action: impl Into<String>, actor: Actor, details: Option<JsonValue>) -> Self {
        Self::at(action, actor, details, Utc::now())
    }

    pub fn at(
        action: impl Into<String>,
        actor: Actor,
        details: Option<JsonValue>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: AUDIT_JOB_SCHEMA_VERSION,
            action: action.into(),
            user_id: actor,
            details,
            timestamp: Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    pub fn to_payload(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a queue payload, rejecting versions newer than this build.
    pub fn from_payload(payload: &JsonValue) -> Result<Self> {
        let job: AuditJob = serde_json::from_value(payload.clone())?;
        if job.schema_version > AUDIT_JOB_SCHEMA_VERSION {
            return Err(CommonError::UnsupportedSchemaVersion {
                found: job.schema_version,
                supported: AUDIT_JOB_SCHEMA_VERSION,
            });
        }
        Ok(job)
    }

    /// Enqueue instant, if the timestamp parses.
    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_system_actor_serializes_as_sentinel() {
        let job = AuditJob::new("HTTP_REQUEST", Actor::System, None);
        let payload = job.to_payload().unwrap();
        assert_eq!(payload["userId"], json!("SYSTEM"));
        assert_eq!(payload["schemaVersion"], json!(1));
        assert!(payload.get("details").is_none());
    }

    #[test]
    fn test_sentinel_and_null_decode_to_system() {
        let from_sentinel = AuditJob::from_payload(&json!({
            "action": "A", "userId": "SYSTEM", "timestamp": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(from_sentinel.user_id, Actor::System);
        assert_eq!(from_sentinel.user_id.user_id(), None);

        let from_null = AuditJob::from_payload(&json!({
            "action": "A", "userId": null, "timestamp": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(from_null.user_id, Actor::System);

        let missing = AuditJob::from_payload(&json!({
            "action": "A", "timestamp": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(missing.user_id, Actor::System);
    }

    #[test]
    fn test_user_actor_round_trip() {
        let job = AuditJob::new("LEAD_CREATED", Actor::user("user_123"), Some(json!({"a": 1})));
        let decoded = AuditJob::from_payload(&job.to_payload().unwrap()).unwrap();
        assert_eq!(decoded.user_id.user_id(), Some("user_123"));
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_missing_schema_version_reads_as_legacy() {
        let job = AuditJob::from_payload(&json!({
            "action": "LEAD_DELETED",
            "userId": "u1",
            "details": {"leadId": "x"},
            "timestamp": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(job.schema_version, 1);
    }

    #[test]
    fn test_newer_schema_version_rejected() {
        let err = AuditJob::from_payload(&json!({
            "schemaVersion": 99,
            "action": "A",
            "timestamp": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            CommonError::UnsupportedSchemaVersion { found: 99, supported: 1 }
        ));
    }

    #[test]
    fn test_missing_action_is_malformed() {
        let err = AuditJob::from_payload(&json!({"timestamp": "x"})).unwrap_err();
        assert!(matches!(err, CommonError::MalformedJob(_)));
    }

    #[test]
    fn test_unstamped_payload_decodes() {
        let job = AuditJob::from_payload(&json!({
            "action": "LEAD_CREATED",
            "userId": "u1",
            "details": {"leadId": "l1"}
        }))
        .unwrap();
        assert_eq!(job.action, "LEAD_CREATED");
        assert_eq!(job.user_id, Actor::user("u1"));
        assert_eq!(job.timestamp, None);
        assert_eq!(job.enqueued_at(), None);
    }

    #[test]
    fn test_timestamp_has_millisecond_precision() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let job = AuditJob::at("A", Actor::System, None, at);
        assert_eq!(job.timestamp.as_deref(), Some("2025-03-04T05:06:07.000Z"));
        assert_eq!(job.enqueued_at(), Some(at));
    }
}
