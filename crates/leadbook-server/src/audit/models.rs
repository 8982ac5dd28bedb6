//! Audit log data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Default page size for audit log queries.
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;

/// Upper bound on a single audit log page.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

// ============================================================================
// Well-known actions
// ============================================================================

pub const HTTP_REQUEST: &str = "HTTP_REQUEST";
pub const HTTP_ERROR: &str = "HTTP_ERROR";
pub const LEAD_CREATED: &str = "LEAD_CREATED";
pub const LEAD_UPDATED: &str = "LEAD_UPDATED";
pub const LEAD_DELETED: &str = "LEAD_DELETED";
pub const CALL_LOG_CREATED: &str = "CALL_LOG_CREATED";
pub const CALL_LOG_UPDATED: &str = "CALL_LOG_UPDATED";
pub const CALL_LOG_DELETED: &str = "CALL_LOG_DELETED";
pub const CALL_LOG_BULK_DELETED: &str = "CALL_LOG_BULK_DELETED";

/// One persisted audit record. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: String,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status_code: Option<i32>,
    pub duration: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<JsonValue>,
    /// `None` for system-originated events.
    pub user_id: Option<String>,
    /// Set by the store at insert time, not at event time.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`AuditRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAuditRecord {
    pub action: String,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status_code: Option<i32>,
    pub duration: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<JsonValue>,
    pub user_id: Option<String>,
}

impl NewAuditRecord {
    /// Builds a record from an action and its details, lifting the well-known
    /// request fields (`method`, `url`, `statusCode`, `duration`, `ip`,
    /// `userAgent`) into columns. `details` is kept whole.
    pub fn from_details(
        action: impl Into<String>,
        user_id: Option<String>,
        details: Option<JsonValue>,
    ) -> Self {
        let d = details.as_ref();
        Self {
            action: action.into(),
            method: detail_text(d, "method"),
            url: detail_text(d, "url"),
            status_code: detail_status(d),
            duration: detail_text(d, "duration"),
            ip: detail_text(d, "ip"),
            user_agent: detail_text(d, "userAgent"),
            user_id,
            details,
        }
    }
}

fn detail_text(details: Option<&JsonValue>, key: &str) -> Option<String> {
    match details?.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

fn detail_status(details: Option<&JsonValue>) -> Option<i32> {
    match details?.get("statusCode")? {
        JsonValue::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Filter for [`crate::audit::AuditLog::find_all`].
#[derive(Debug, Clone, Deserialize)]
pub struct AuditFilter {
    pub action: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            action: None,
            limit: DEFAULT_AUDIT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl AuditFilter {
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// `limit` clamped to `1..=MAX_AUDIT_QUERY_LIMIT`, `offset` to `>= 0`.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_AUDIT_QUERY_LIMIT);
        self.offset = self.offset.max(0);
        self
    }
}

fn default_limit() -> i64 {
    DEFAULT_AUDIT_QUERY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_details_flattens_request_fields() {
        let details = json!({
            "method": "POST",
            "url": "/api/leads",
            "statusCode": 201,
            "duration": "42ms",
            "ip": "10.0.0.1",
            "userAgent": "curl/8.0",
            "extra": {"nested": [1, 2, 3]}
        });

        let record = NewAuditRecord::from_details(HTTP_REQUEST, None, Some(details.clone()));

        assert_eq!(record.method.as_deref(), Some("POST"));
        assert_eq!(record.url.as_deref(), Some("/api/leads"));
        assert_eq!(record.status_code, Some(201));
        assert_eq!(record.duration.as_deref(), Some("42ms"));
        assert_eq!(record.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(record.details, Some(details));
    }

    #[test]
    fn test_from_details_without_request_fields() {
        let record = NewAuditRecord::from_details(
            LEAD_CREATED,
            Some("user_1".into()),
            Some(json!({"leadId": "abc"})),
        );
        assert_eq!(record.method, None);
        assert_eq!(record.status_code, None);
        assert_eq!(record.user_id.as_deref(), Some("user_1"));

        let bare = NewAuditRecord::from_details(LEAD_DELETED, None, None);
        assert_eq!(bare.details, None);
        assert_eq!(bare.url, None);
    }

    #[test]
    fn test_status_code_accepts_string() {
        let record =
            NewAuditRecord::from_details(HTTP_ERROR, None, Some(json!({"statusCode": "404"})));
        assert_eq!(record.status_code, Some(404));
    }

    #[test]
    fn test_filter_normalization() {
        let filter = AuditFilter {
            action: None,
            limit: 50_000,
            offset: -3,
        }
        .normalized();
        assert_eq!(filter.limit, MAX_AUDIT_QUERY_LIMIT);
        assert_eq!(filter.offset, 0);

        let defaults = AuditFilter::default();
        assert_eq!(defaults.limit, 100);
        assert_eq!(defaults.offset, 0);
    }
}
