//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject duplicate handler ids and unusable responses
//! - Validate addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Path patterns are not checked here: a malformed pattern is an
//!   activation failure and shows up in the registry status instead
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::{HandlerConfig, ServerConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("duplicate handler id {0}")]
    DuplicateHandlerId(u64),

    #[error("handler {id}: invalid status code {status}")]
    InvalidStatus { id: u64, status: u16 },

    #[error("handler {0}: set either body or body_file, not both")]
    ConflictingBody(u64),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Validate a whole configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address("listener", &config.listener.bind_address, &mut errors);
    if config.admin.enabled {
        check_address("admin", &config.admin.bind_address, &mut errors);
    }
    if config.observability.metrics_enabled {
        check_address("metrics", &config.observability.metrics_address, &mut errors);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for handler in &config.handlers {
        if !seen.insert(handler.id) {
            errors.push(ValidationError::DuplicateHandlerId(handler.id));
        }
        if let Err(e) = validate_handler(handler) {
            errors.extend(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one handler definition.
pub fn validate_handler(handler: &HandlerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if StatusCode::from_u16(handler.status).is_err() {
        errors.push(ValidationError::InvalidStatus {
            id: handler.id,
            status: handler.status,
        });
    }
    if handler.body.is_some() && handler.body_file.is_some() {
        errors.push(ValidationError::ConflictingBody(handler.id));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
