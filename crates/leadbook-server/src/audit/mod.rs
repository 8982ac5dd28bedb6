//! Asynchronous audit pipeline
//!
//! ```text
//!  request / domain mutation
//!        │
//!        ▼
//!  AuditRecorder ──submit("log-action")──▶ TaskQueue ──reserve──▶ AuditWorker
//!                                                                    │
//!                                                     AuditLog::create_log
//!                                                                    ▼
//!                                     RetentionSweeper ──▶ audit_log table
//! ```
//!
//! Producers only wait for the queue to accept a job. The worker writes the
//! record later, possibly in another process, and possibly more than once
//! after a redelivery. Audit failures never reach the HTTP client.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod recorder;
pub mod retention;
pub mod routes;
pub mod store;
pub mod worker;

pub use memory::MemoryAuditLogStore;
pub use models::{AuditFilter, AuditRecord, NewAuditRecord};
pub use postgres::PgAuditLogStore;
pub use recorder::AuditRecorder;
pub use retention::RetentionSweeper;
pub use store::{AuditLog, AuditLogStore, AuditStoreError};
pub use worker::{AuditWorker, JobOutcome, WorkerOptions};
