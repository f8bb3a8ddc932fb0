//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the prefix can be joined with mapping paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MockConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, Method};

use crate::config::schema::MockConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidPrefix(String),
    ZeroRequestTimeout,
    ZeroBodyLimit,
    InvalidMetricsAddress(String),
    InvalidCorsMethod(String),
    InvalidCorsHeader(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(a) => write!(f, "listener.bind_address {:?} is not a socket address", a),
            ValidationError::InvalidPrefix(p) => {
                write!(f, "mappings.prefix {:?} must be empty or start with '/' and not end with '/'", p)
            }
            ValidationError::ZeroRequestTimeout => write!(f, "timeouts.request_secs must be greater than 0"),
            ValidationError::ZeroBodyLimit => write!(f, "security.max_body_size must be greater than 0"),
            ValidationError::InvalidMetricsAddress(a) => {
                write!(f, "observability.metrics_address {:?} is not a socket address", a)
            }
            ValidationError::InvalidCorsMethod(m) => write!(f, "cors.allowed_methods: invalid method {:?}", m),
            ValidationError::InvalidCorsHeader(h) => write!(f, "cors.allowed_headers: invalid header {:?}", h),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &MockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    if !is_valid_prefix(&config.mappings.prefix) {
        errors.push(ValidationError::InvalidPrefix(config.mappings.prefix.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.cors.enabled {
        for method in &config.cors.allowed_methods {
            if Method::from_bytes(method.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidCorsMethod(method.clone()));
            }
        }
        for header in &config.cors.allowed_headers {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidCorsHeader(header.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.is_empty()
        || (prefix.starts_with('/') && !prefix.ends_with('/') && !prefix.chars().any(char::is_whitespace))
}
