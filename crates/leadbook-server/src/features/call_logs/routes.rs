//! Call log API routes
//!
//! - `POST /api/call-logs` - Record a call
//! - `GET /api/call-logs` - List calls with filters, pagination and call-type stats
//! - `POST /api/call-logs/bulk-delete` - Delete many calls by id
//! - `GET /api/call-logs/user/:email` - Latest calls of one agent
//! - `GET /api/call-logs/:id` - Get a single call
//! - `PUT /api/call-logs/:id` - Partially update a call
//! - `DELETE /api/call-logs/:id` - Delete a call

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    commands::{
        self, BulkDeleteCallLogsCommand, BulkDeleteCallLogsError, CreateCallLogCommand,
        CreateCallLogError, DeleteCallLogError, UpdateCallLogCommand, UpdateCallLogError,
    },
    queries::{self, GetCallLogError, ListCallLogsError, ListCallLogsQuery, ListCallLogsResponse},
    types::CallLog,
};
use crate::api::extract::{ValidJson, ValidPath, ValidQuery};
use crate::api::response::DeletedCount;
use crate::auth::Principal;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn call_logs_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_call_logs).post(create_call_log))
        .route("/bulk-delete", post(bulk_delete_call_logs))
        .route("/user/:email", get(list_user_call_logs))
        .route(
            "/:id",
            get(get_call_log).put(update_call_log).delete(delete_call_log),
        )
}

#[tracing::instrument(skip(state, principal, command), fields(user_id = %principal.id))]
async fn create_call_log(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidJson(command): ValidJson<CreateCallLogCommand>,
) -> Result<(StatusCode, Json<CallLog>), AppError> {
    let call_log =
        commands::create::handle(&state.db, &state.recorder, principal.actor(), command).await?;
    Ok((StatusCode::CREATED, Json(call_log)))
}

async fn list_call_logs(
    State(state): State<FeatureState>,
    ValidQuery(query): ValidQuery<ListCallLogsQuery>,
) -> Result<Json<ListCallLogsResponse>, AppError> {
    Ok(Json(queries::list::handle(&state.db, query).await?))
}

#[derive(Debug, Deserialize)]
struct UserCallLogsParams {
    limit: Option<i64>,
}

async fn list_user_call_logs(
    State(state): State<FeatureState>,
    ValidPath(email): ValidPath<String>,
    ValidQuery(params): ValidQuery<UserCallLogsParams>,
) -> Result<Json<Vec<CallLog>>, AppError> {
    Ok(Json(
        queries::by_user::handle(&state.db, &email, params.limit).await?,
    ))
}

async fn get_call_log(
    State(state): State<FeatureState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<CallLog>, AppError> {
    Ok(Json(queries::get::handle(&state.db, id).await?))
}

#[tracing::instrument(skip(state, principal, command), fields(user_id = %principal.id))]
async fn update_call_log(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(command): ValidJson<UpdateCallLogCommand>,
) -> Result<Json<CallLog>, AppError> {
    let call_log =
        commands::update::handle(&state.db, &state.recorder, principal.actor(), id, command)
            .await?;
    Ok(Json(call_log))
}

#[tracing::instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn delete_call_log(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<CallLog>, AppError> {
    let call_log =
        commands::delete::handle(&state.db, &state.recorder, principal.actor(), id).await?;
    Ok(Json(call_log))
}

#[tracing::instrument(skip(state, principal, command), fields(user_id = %principal.id))]
async fn bulk_delete_call_logs(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidJson(command): ValidJson<BulkDeleteCallLogsCommand>,
) -> Result<Json<DeletedCount>, AppError> {
    let deleted =
        commands::bulk_delete::handle(&state.db, &state.recorder, principal.actor(), command)
            .await?;
    Ok(Json(deleted))
}

// ============================================================================
// Error Mapping
// ============================================================================

impl From<CreateCallLogError> for AppError {
    fn from(err: CreateCallLogError) -> Self {
        match err {
            CreateCallLogError::Validation(e) => AppError::Validation(e.to_string()),
            CreateCallLogError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<UpdateCallLogError> for AppError {
    fn from(err: UpdateCallLogError) -> Self {
        match err {
            UpdateCallLogError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateCallLogError::NoFieldsToUpdate | UpdateCallLogError::Validation(_) => {
                AppError::Validation(err.to_string())
            },
            UpdateCallLogError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DeleteCallLogError> for AppError {
    fn from(err: DeleteCallLogError) -> Self {
        match err {
            DeleteCallLogError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteCallLogError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<BulkDeleteCallLogsError> for AppError {
    fn from(err: BulkDeleteCallLogsError) -> Self {
        match err {
            BulkDeleteCallLogsError::Empty | BulkDeleteCallLogsError::TooMany => {
                AppError::Validation(err.to_string())
            },
            BulkDeleteCallLogsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetCallLogError> for AppError {
    fn from(err: GetCallLogError) -> Self {
        match err {
            GetCallLogError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetCallLogError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListCallLogsError> for AppError {
    fn from(err: ListCallLogsError) -> Self {
        match err {
            ListCallLogsError::Database(e) => AppError::Database(e),
            other => AppError::Validation(other.to_string()),
        }
    }
}
