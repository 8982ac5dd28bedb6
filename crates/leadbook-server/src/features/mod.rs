//! Feature slices of the Leadbook API
//!
//! Each slice is laid out as:
//! - `commands/` - Write operations (create, update, delete), each recording
//!   an audit event for the acting user
//! - `queries/` - Read operations (get, list)
//! - `routes.rs` - HTTP handlers and error mapping
//! - `types.rs` - The entity and its enumerations
//!
//! # Features
//!
//! - **leads**: Sales leads with status stats
//! - **call_logs**: Agent call history with call-type stats and bulk delete
//! - **uploads**: Presigned direct-to-bucket uploads

pub mod call_logs;
pub mod leads;
pub mod shared;
pub mod uploads;

use std::sync::Arc;

use axum::{middleware, Router};

use crate::audit::{routes::audit_routes, AuditLog, AuditRecorder};
use crate::auth::{require_auth, IdentityVerifier};
use crate::storage::Storage;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for the business tables
    pub db: sqlx::PgPool,
    /// Producer side of the audit pipeline
    pub recorder: AuditRecorder,
    /// Read side of the audit log
    pub audit_log: AuditLog,
    /// S3-compatible storage for presigned uploads
    pub storage: Storage,
    /// Session token verification for the auth guard
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Creates the `/api` router. Every route in it requires a bearer token.
///
/// - `/leads` - Lead management
/// - `/call-logs` - Call log management
/// - `/uploads` - Presigned uploads
/// - `/audit-logs` - Audit log reads
pub fn router(state: FeatureState) -> Router<()> {
    let verifier = state.verifier.clone();

    Router::new()
        .nest("/leads", leads::leads_routes().with_state(state.clone()))
        .nest("/call-logs", call_logs::call_logs_routes().with_state(state.clone()))
        .nest("/uploads", uploads::uploads_routes().with_state(state.clone()))
        .nest("/audit-logs", audit_routes().with_state(state.audit_log.clone()))
        .route_layer(middleware::from_fn_with_state(verifier, require_auth))
}
