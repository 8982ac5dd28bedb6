pub mod presign;

pub use presign::{PresignUploadCommand, PresignUploadError, PresignUploadResponse};
