//! Leadbook Common Library
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//!
//! Types shared by every Leadbook process.
//!
//! - **audit_job**: the wire contract for audit events travelling through the
//!   task queue. The API process produces these and the worker process consumes
//!   them, so both compile against this one definition.
//! - **logging**: tracing subscriber setup driven by `LOG_*` environment variables.
//! - **error**: the error type for the above.

pub mod audit_job;
pub mod error;
pub mod logging;

pub use audit_job::{Actor, AuditJob};
pub use error::{CommonError, Result};
