//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (forwarding client names a profile)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::client::HTTP_PROXY_CLIENT_NAME;
use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("upstream.target '{0}' is not an absolute http(s) url")]
    InvalidUpstreamTarget(String),

    #[error("forwarding.client '{0}' does not name a client profile")]
    UnknownClientProfile(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let target_ok = Url::parse(&config.upstream.target)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if !target_ok {
        errors.push(ValidationError::InvalidUpstreamTarget(
            config.upstream.target.clone(),
        ));
    }

    let client = &config.forwarding.client;
    if client != HTTP_PROXY_CLIENT_NAME && !config.clients.contains_key(client) {
        errors.push(ValidationError::UnknownClientProfile(client.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs".into()));
    }
    for (name, profile) in &config.clients {
        if profile.connect_timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout(format!(
                "clients.{name}.connect_timeout_secs"
            )));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
