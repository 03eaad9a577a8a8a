//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check tier ordering invariants (unique, positive)
//! - Validate value ranges (timeouts > 0, parseable addresses/URLs)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{OriginConfig, ProxyConfig};

/// A single semantic configuration problem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no origins configured")]
    NoOrigins,

    #[error("duplicate origin id '{0}'")]
    DuplicateOriginId(String),

    #[error("duplicate tier {tier} (origin '{id}')")]
    DuplicateTier { id: String, tier: u32 },

    #[error("tier must be positive (origin '{0}')")]
    ZeroTier(String),

    #[error("invalid base url for origin '{id}': {reason}")]
    InvalidBaseUrl { id: String, reason: String },

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_origins(&config.origins);

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.probe.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("probe.interval_secs"));
    }
    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("probe.timeout_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.upstream_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the origin list: non-empty, unique ids, unique positive tiers,
/// parseable base URLs.
pub fn validate_origins(origins: &[OriginConfig]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if origins.is_empty() {
        errors.push(ValidationError::NoOrigins);
        return errors;
    }

    let mut seen_ids = HashSet::new();
    let mut seen_tiers = HashSet::new();

    for origin in origins {
        if !seen_ids.insert(origin.id.as_str()) {
            errors.push(ValidationError::DuplicateOriginId(origin.id.clone()));
        }
        if origin.tier == 0 {
            errors.push(ValidationError::ZeroTier(origin.id.clone()));
        } else if !seen_tiers.insert(origin.tier) {
            errors.push(ValidationError::DuplicateTier {
                id: origin.id.clone(),
                tier: origin.tier,
            });
        }
        if let Err(e) = url::Url::parse(&origin.url) {
            errors.push(ValidationError::InvalidBaseUrl {
                id: origin.id.clone(),
                reason: e.to_string(),
            });
        }
    }

    errors
}
