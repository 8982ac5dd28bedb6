//! Direct-to-bucket uploads

pub mod commands;
pub mod routes;

pub use commands::{PresignUploadCommand, PresignUploadError, PresignUploadResponse};
pub use routes::uploads_routes;
