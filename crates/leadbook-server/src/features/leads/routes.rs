//! Lead API routes
//!
//! - `POST /api/leads` - Create a lead
//! - `GET /api/leads` - List leads with filters, pagination and status stats
//! - `GET /api/leads/:id` - Get a single lead
//! - `PUT /api/leads/:id` - Partially update a lead
//! - `DELETE /api/leads/:id` - Delete a lead
//!
//! All routes sit behind the auth guard; mutations are attributed to the
//! authenticated principal in the audit log.

use axum::{extract::State, http::StatusCode, routing::get, Extension, Json, Router};
use uuid::Uuid;

use super::{
    commands::{
        self, CreateLeadCommand, CreateLeadError, DeleteLeadError, UpdateLeadCommand,
        UpdateLeadError,
    },
    queries::{self, GetLeadError, ListLeadsError, ListLeadsQuery, ListLeadsResponse},
    types::Lead,
};
use crate::api::extract::{ValidJson, ValidPath, ValidQuery};
use crate::auth::Principal;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn leads_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/:id", get(get_lead).put(update_lead).delete(delete_lead))
}

#[tracing::instrument(skip(state, principal, command), fields(user_id = %principal.id))]
async fn create_lead(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidJson(command): ValidJson<CreateLeadCommand>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let lead =
        commands::create::handle(&state.db, &state.recorder, principal.actor(), command).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn list_leads(
    State(state): State<FeatureState>,
    ValidQuery(query): ValidQuery<ListLeadsQuery>,
) -> Result<Json<ListLeadsResponse>, AppError> {
    let response = queries::list::handle(&state.db, query).await?;
    tracing::debug!(
        count = response.data.len(),
        total = response.meta.total,
        "Leads listed via API"
    );
    Ok(Json(response))
}

async fn get_lead(
    State(state): State<FeatureState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Lead>, AppError> {
    Ok(Json(queries::get::handle(&state.db, id).await?))
}

#[tracing::instrument(skip(state, principal, command), fields(user_id = %principal.id))]
async fn update_lead(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(command): ValidJson<UpdateLeadCommand>,
) -> Result<Json<Lead>, AppError> {
    let lead =
        commands::update::handle(&state.db, &state.recorder, principal.actor(), id, command)
            .await?;
    Ok(Json(lead))
}

#[tracing::instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn delete_lead(
    State(state): State<FeatureState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Lead>, AppError> {
    let lead = commands::delete::handle(&state.db, &state.recorder, principal.actor(), id).await?;
    Ok(Json(lead))
}

// ============================================================================
// Error Mapping
// ============================================================================

impl From<CreateLeadError> for AppError {
    fn from(err: CreateLeadError) -> Self {
        match err {
            CreateLeadError::Validation(e) => AppError::Validation(e.to_string()),
            CreateLeadError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<UpdateLeadError> for AppError {
    fn from(err: UpdateLeadError) -> Self {
        match err {
            UpdateLeadError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateLeadError::NoFieldsToUpdate | UpdateLeadError::Validation(_) => {
                AppError::Validation(err.to_string())
            },
            UpdateLeadError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DeleteLeadError> for AppError {
    fn from(err: DeleteLeadError) -> Self {
        match err {
            DeleteLeadError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteLeadError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetLeadError> for AppError {
    fn from(err: GetLeadError) -> Self {
        match err {
            GetLeadError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetLeadError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListLeadsError> for AppError {
    fn from(err: ListLeadsError) -> Self {
        match err {
            ListLeadsError::InvalidPagination(msg) => AppError::Validation(msg.to_string()),
            ListLeadsError::Database(e) => AppError::Database(e),
        }
    }
}
