//! Inbound side of one forwarding invocation.
//!
//! The hosting server owns the connection; it hands the core a request head,
//! a body stream, the peer addresses, a cancellation token tied to the inbound
//! request's lifetime, and a sink for the response.

use std::net::IpAddr;

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::uri::Scheme;
use axum::http::{header, HeaderMap, Method, Request, Uri};
use tokio_util::sync::CancellationToken;

use crate::proxy::sink::ResponseSink;

/// Peer addresses of the inbound connection. Either side may be unknown
/// (e.g. unix sockets or in-process hosts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub local_addr: Option<IpAddr>,
    pub remote_addr: Option<IpAddr>,
}

impl ConnectionInfo {
    pub fn new(local_addr: Option<IpAddr>, remote_addr: Option<IpAddr>) -> Self {
        Self {
            local_addr,
            remote_addr,
        }
    }
}

/// Everything the core knows about the inbound exchange.
pub struct InboundContext {
    head: Parts,
    body: Option<Body>,
    connection: ConnectionInfo,
    scheme: Scheme,
    cancellation: CancellationToken,
    response: Box<dyn ResponseSink>,
}

impl InboundContext {
    /// Wrap an inbound request. The scheme defaults to the request URI's
    /// scheme, or `http` for origin-form URIs.
    pub fn new(
        request: Request<Body>,
        connection: ConnectionInfo,
        response: Box<dyn ResponseSink>,
    ) -> Self {
        let (head, body) = request.into_parts();
        let scheme = head.uri.scheme().cloned().unwrap_or(Scheme::HTTP);
        Self {
            head,
            body: Some(body),
            connection,
            scheme,
            cancellation: CancellationToken::new(),
            response,
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host as presented by the client: the `Host` header, falling back to the
    /// URI authority (HTTP/2 `:authority`), or empty when neither is present.
    pub fn host(&self) -> String {
        if let Some(host) = self.head.headers.get(header::HOST) {
            return String::from_utf8_lossy(host.as_bytes()).into_owned();
        }
        self.head
            .uri
            .authority()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Take the request body. Subsequent calls return an empty body.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_else(Body::empty)
    }

    pub fn response(&self) -> &dyn ResponseSink {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> &mut dyn ResponseSink {
        self.response.as_mut()
    }
}

impl std::fmt::Debug for InboundContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundContext")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("connection", &self.connection)
            .field("scheme", &self.scheme)
            .field("body_taken", &self.body.is_none())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::sink::MemorySink;

    fn context(request: Request<Body>) -> InboundContext {
        InboundContext::new(request, ConnectionInfo::default(), Box::new(MemorySink::new()))
    }

    #[test]
    fn test_host_prefers_header() {
        let request = Request::builder()
            .uri("http://authority.test/a")
            .header("Host", "header.test:8080")
            .body(Body::empty())
            .unwrap();
        assert_eq!(context(request).host(), "header.test:8080");
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let request = Request::builder()
            .uri("https://authority.test/a")
            .body(Body::empty())
            .unwrap();
        let ctx = context(request);
        assert_eq!(ctx.host(), "authority.test");
        assert_eq!(ctx.scheme(), &Scheme::HTTPS);
    }

    #[test]
    fn test_host_empty_when_unknown() {
        let request = Request::builder().uri("/a").body(Body::empty()).unwrap();
        let ctx = context(request);
        assert_eq!(ctx.host(), "");
        assert_eq!(ctx.scheme(), &Scheme::HTTP);
    }
}
