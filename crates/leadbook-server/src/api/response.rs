//! Response helpers shared by every route

use serde::Serialize;

/// Error text attached to failed responses as an extension, so middleware
/// wrapping the router can report why a request failed without parsing bodies.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

/// Body of `DELETE`-many style endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}
