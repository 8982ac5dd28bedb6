//! Leadbook server library
//!
//! CRM backend for leads and call logs with an asynchronous audit pipeline.
//! The binaries (`leadbook-server`, `leadbook-worker`, `leadbook-seed`) are
//! thin wrappers over these modules.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod queue;
pub mod shutdown;
pub mod storage;

pub use error::AppError;
