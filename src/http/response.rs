//! Response handling for forwarding failures.
//!
//! # Responsibilities
//! - Map forwarding errors to HTTP status codes
//!
//! # Design Decisions
//! - Upstream timeouts result in 504 Gateway Timeout
//! - Transport and body failures result in 502 Bad Gateway
//! - Misconfiguration (bad target, unknown client) is the relay's own fault: 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::proxy::ProxyError;

/// Status the client sees when forwarding failed before a response began.
pub fn status_for(err: &ProxyError) -> StatusCode {
    match err {
        ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ProxyError::UpstreamUnreachable(_) | ProxyError::BodyStreamFailure(_) => {
            StatusCode::BAD_GATEWAY
        }
        ProxyError::InvalidTarget(_) | ProxyError::UnknownClient(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn error_response(err: &ProxyError) -> Response {
    let status = status_for(err);
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::proxy::ExchangePhase;
    use std::io;

    #[test]
    fn test_status_mapping() {
        let timeout = ProxyError::UpstreamTimeout {
            phase: ExchangePhase::Dispatch,
        };
        let unreachable = ProxyError::UpstreamUnreachable(ClientError::Connect("refused".into()));
        let body = ProxyError::BodyStreamFailure(io::Error::other("reset"));

        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&unreachable), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&body), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&ProxyError::UnknownClient("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ProxyError::InvalidTarget("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_body() {
        let response = error_response(&ProxyError::UpstreamTimeout {
            phase: ExchangePhase::BodyCopy,
        });
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
