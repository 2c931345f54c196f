//! Proxy identification headers.
//!
//! # Responsibilities
//! - `X-Forwarded-For`, `X-Forwarded-Proto`, `X-Forwarded-Host`
//! - RFC 7239 `Forwarded` with `proto`, `host`, `by` and `for` parameters
//!
//! # Design Decisions
//! - Values are appended, never replacing what an earlier hop added
//! - IPv6 nodes are quoted and bracketed (`"[2001:db8::1]"`); a bare IPv6
//!   literal is ambiguous with the header's own `:` and `;` syntax
//! - Values are not validated; anything the header map cannot hold is skipped

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::proxy::context::InboundContext;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Identification data for one hop, extracted from the inbound exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub host: String,
    pub proto: String,
    pub by: Option<IpAddr>,
    pub for_addr: Option<IpAddr>,
}

impl ForwardedHeaders {
    pub fn from_context(ctx: &InboundContext) -> Self {
        let connection = ctx.connection();
        Self {
            host: ctx.host(),
            proto: ctx.scheme().as_str().to_string(),
            by: connection.local_addr,
            for_addr: connection.remote_addr,
        }
    }

    /// The combined `Forwarded` value. Every parameter keeps its trailing `;`.
    pub fn forwarded_value(&self) -> String {
        let mut value = format!("proto={};host={};", self.proto, self.host);
        if let Some(by) = self.by {
            value.push_str("by=");
            value.push_str(&forwarded_node(by));
            value.push(';');
        }
        if let Some(for_addr) = self.for_addr {
            value.push_str("for=");
            value.push_str(&forwarded_node(for_addr));
            value.push(';');
        }
        value
    }

    /// Append all identification headers to `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(remote) = self.for_addr {
            append_raw(headers, X_FORWARDED_FOR, remote.to_string());
        }
        append_raw(headers, X_FORWARDED_PROTO, self.proto.clone());
        append_raw(headers, X_FORWARDED_HOST, self.host.clone());
        append_raw(headers, header::FORWARDED, self.forwarded_value());
    }
}

fn forwarded_node(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("\"[{}]\"", v6),
    }
}

fn append_raw(headers: &mut HeaderMap, name: HeaderName, value: String) {
    match HeaderValue::from_maybe_shared(bytes::Bytes::from(value)) {
        Ok(value) => {
            headers.append(name, value);
        }
        Err(_) => {
            tracing::debug!(header = %name, "Skipping unrepresentable forwarding header value");
        }
    }
}
