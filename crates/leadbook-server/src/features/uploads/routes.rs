//! Upload API routes
//!
//! - `POST /api/uploads/presigned` - Presigned `PUT` URL for a direct upload

use axum::{extract::State, routing::post, Json, Router};

use super::commands::{self, PresignUploadCommand, PresignUploadError, PresignUploadResponse};
use crate::api::extract::ValidJson;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn uploads_routes() -> Router<FeatureState> {
    Router::new().route("/presigned", post(presign_upload))
}

async fn presign_upload(
    State(state): State<FeatureState>,
    ValidJson(command): ValidJson<PresignUploadCommand>,
) -> Result<Json<PresignUploadResponse>, AppError> {
    Ok(Json(commands::presign::handle(&state.storage, command).await?))
}

impl From<PresignUploadError> for AppError {
    fn from(err: PresignUploadError) -> Self {
        match err {
            PresignUploadError::Storage(e) => AppError::Storage(format!("{e:#}")),
            other => AppError::Validation(other.to_string()),
        }
    }
}
