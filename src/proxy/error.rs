//! Forwarding errors.
//!
//! Every failure propagates to the caller as-is. Translating a failure into a
//! client-visible status (502/504) belongs to the hosting server.

use std::fmt;

use thiserror::Error;

use crate::client::ClientError;

/// Stage of the exchange that was running when a timeout or cancellation hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Waiting for the upstream response head.
    Dispatch,
    /// Copying the upstream body into the response sink.
    BodyCopy,
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangePhase::Dispatch => f.write_str("dispatch"),
            ExchangePhase::BodyCopy => f.write_str("body copy"),
        }
    }
}

/// Errors produced by a single forwarding invocation.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] ClientError),

    #[error("upstream timed out or request was cancelled during {phase}")]
    UpstreamTimeout { phase: ExchangePhase },

    #[error("body stream failure: {0}")]
    BodyStreamFailure(#[source] std::io::Error),

    #[error("invalid target uri: {0}")]
    InvalidTarget(String),

    #[error("no http client registered under '{0}'")]
    UnknownClient(String),
}

impl ProxyError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
            ProxyError::UpstreamTimeout { .. } => "upstream_timeout",
            ProxyError::BodyStreamFailure(_) => "body_stream_failure",
            ProxyError::InvalidTarget(_) => "invalid_target",
            ProxyError::UnknownClient(_) => "unknown_client",
        }
    }
}

impl From<ClientError> for ProxyError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Timeout(_) => ProxyError::UpstreamTimeout {
                phase: ExchangePhase::Dispatch,
            },
            other => ProxyError::UpstreamUnreachable(other),
        }
    }
}
