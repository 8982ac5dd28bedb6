//! Audit log read API
//!
//! - `GET /api/audit-logs?action&limit&offset` - Newest records first
//! - `GET /api/audit-logs/actor/:user_id?limit` - Records attributed to one user
//! - `GET /api/audit-logs/count?action` - Number of records with an action

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::models::{AuditFilter, AuditRecord};
use super::store::{AuditLog, AuditStoreError};
use crate::api::extract::{ValidPath, ValidQuery};
use crate::error::AppError;

pub fn audit_routes() -> Router<AuditLog> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/count", get(count_audit_logs))
        .route("/actor/:user_id", get(list_actor_audit_logs))
}

async fn list_audit_logs(
    State(audit_log): State<AuditLog>,
    ValidQuery(filter): ValidQuery<AuditFilter>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    Ok(Json(audit_log.find_all(filter).await?))
}

#[derive(Debug, Deserialize)]
struct ActorParams {
    limit: Option<i64>,
}

async fn list_actor_audit_logs(
    State(audit_log): State<AuditLog>,
    ValidPath(user_id): ValidPath<String>,
    ValidQuery(params): ValidQuery<ActorParams>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    Ok(Json(audit_log.find_by_actor(&user_id, params.limit).await?))
}

#[derive(Debug, Deserialize)]
struct CountParams {
    action: Option<String>,
}

#[derive(Debug, Serialize)]
struct ActionCount {
    action: String,
    count: i64,
}

async fn count_audit_logs(
    State(audit_log): State<AuditLog>,
    ValidQuery(params): ValidQuery<CountParams>,
) -> Result<Json<ActionCount>, AppError> {
    let action = params
        .action
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| AppError::Validation("action is required".to_string()))?;
    let count = audit_log.count_by_action(&action).await?;
    Ok(Json(ActionCount { action, count }))
}

impl From<AuditStoreError> for AppError {
    fn from(err: AuditStoreError) -> Self {
        match err {
            AuditStoreError::Database(e) => AppError::Database(e),
            AuditStoreError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{models::NewAuditRecord, MemoryAuditLogStore};
    use axum::{body::Body, http::Request, http::StatusCode};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn seeded() -> Router {
        let store = MemoryAuditLogStore::new();
        let now = Utc::now();
        for (i, (action, user)) in [
            ("LEAD_CREATED", Some("user_1")),
            ("HTTP_REQUEST", None),
            ("LEAD_CREATED", Some("user_2")),
            ("LEAD_DELETED", Some("user_1")),
        ]
        .into_iter()
        .enumerate()
        {
            store.insert_at(
                NewAuditRecord::from_details(action, user.map(str::to_string), Some(json!({"i": i}))),
                now + Duration::seconds(i as i64),
            );
        }
        audit_routes().with_state(AuditLog::new(Arc::new(store)))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = seeded()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_filters_by_action_newest_first() {
        let (status, body) = get_json("/?action=LEAD_CREATED").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["userId"], "user_2");
        assert_eq!(rows[1]["userId"], "user_1");
    }

    #[tokio::test]
    async fn test_list_window() {
        let (_, body) = get_json("/?limit=1&offset=1").await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["details"]["i"], 2);
    }

    #[tokio::test]
    async fn test_actor_and_count() {
        let (_, body) = get_json("/actor/user_1").await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = get_json("/count?action=LEAD_CREATED").await;
        assert_eq!(body, json!({"action": "LEAD_CREATED", "count": 2}));

        let (_, body) = get_json("/count?action=NOPE").await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_count_requires_action() {
        let (status, body) = get_json("/count").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_limit_is_validation_error() {
        let (status, _) = get_json("/?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
