//! Inbound request handling.
//!
//! # Responsibilities
//! - Capture connection addresses at accept time
//! - Compute the upstream URL for an inbound request
//! - Read the request ID assigned by the request-id layer

use std::net::SocketAddr;

use axum::extract::connect_info::Connected;
use axum::http::{HeaderMap, HeaderName, Uri};
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

use crate::proxy::ConnectionInfo;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Local and remote socket addresses of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerInfo {
    pub local: Option<SocketAddr>,
    pub remote: SocketAddr,
}

impl PeerInfo {
    pub fn connection(&self) -> ConnectionInfo {
        ConnectionInfo::new(self.local.map(|a| a.ip()), Some(self.remote.ip()))
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for PeerInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self {
            local: stream.io().local_addr().ok(),
            remote: *stream.remote_addr(),
        }
    }
}

/// Upstream URL for `uri`: the base with trailing slashes removed, followed
/// by the inbound path and query.
pub fn upstream_url(base: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
