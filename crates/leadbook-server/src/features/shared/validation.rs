//! Shared validation utilities
//!
//! ```rust,ignore
//! use leadbook_server::features::shared::validation::{validate_required, validate_phone};
//!
//! validate_required("leadName", &command.lead_name, 255)?;
//! validate_phone(&command.phone_number)?;
//! ```

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static PHONE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\+?[0-9\s-]+$").ok());

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// A single field-level validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be at most {max_length} characters")]
    TooLong { field: &'static str, max_length: usize },

    #[error("{field} must be a valid phone number")]
    InvalidPhone { field: &'static str },

    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}

/// Non-blank and at most `max_length` characters.
pub fn validate_required(
    field: &'static str,
    value: &str,
    max_length: usize,
) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Required { field });
    }
    validate_length(field, value, max_length)
}

pub fn validate_length(
    field: &'static str,
    value: &str,
    max_length: usize,
) -> Result<(), FieldError> {
    if value.chars().count() > max_length {
        return Err(FieldError::TooLong { field, max_length });
    }
    Ok(())
}

/// Digits, spaces and hyphens with an optional leading `+`.
pub fn validate_phone(field: &'static str, value: &str) -> Result<(), FieldError> {
    match PHONE_RE.as_ref() {
        Some(re) if re.is_match(value) => Ok(()),
        _ => Err(FieldError::InvalidPhone { field }),
    }
}

pub fn validate_email(field: &'static str, value: &str) -> Result<(), FieldError> {
    match EMAIL_RE.as_ref() {
        Some(re) if re.is_match(value) => Ok(()),
        _ => Err(FieldError::InvalidEmail { field }),
    }
}

pub fn validate_non_negative(field: &'static str, value: i32) -> Result<(), FieldError> {
    if value < 0 {
        return Err(FieldError::Negative { field });
    }
    Ok(())
}
