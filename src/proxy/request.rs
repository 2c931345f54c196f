//! Outbound request construction.
//!
//! # Responsibilities
//! - Copy the method verbatim
//! - Attach the inbound body stream unless the method is bodyless
//! - Place each inbound header in the request or content header set
//! - Add identification headers (optional)
//! - Point `Host`, method and URI at the target
//!
//! # Design Decisions
//! - GET, HEAD, DELETE and TRACE never carry a body, even when the inbound
//!   transport delivered payload bytes
//! - Header values are copied byte-for-byte; nothing is re-parsed
//! - Headers that fit neither set are dropped without a trace

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, Request, Uri};
use url::Url;

use crate::proxy::context::InboundContext;
use crate::proxy::error::ProxyError;
use crate::proxy::forwarded::ForwardedHeaders;
use crate::proxy::headers::HeaderKind;

const BODYLESS_METHODS: [&str; 4] = ["GET", "HEAD", "DELETE", "TRACE"];

/// Body plus the headers that describe it.
#[derive(Debug)]
pub struct OutboundContent {
    pub headers: HeaderMap,
    pub body: Body,
}

/// The request sent upstream. Method and target are fixed at construction.
#[derive(Debug)]
pub struct OutboundRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    content: Option<OutboundContent>,
}

impl OutboundRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content(&self) -> Option<&OutboundContent> {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> Option<&mut OutboundContent> {
        self.content.as_mut()
    }

    /// Try the request header set, then the content header set. Returns
    /// whether the value was placed.
    pub fn place_header(&mut self, name: &HeaderName, value: HeaderValue) -> bool {
        match HeaderKind::of(name) {
            HeaderKind::Request => {
                self.headers.append(name.clone(), value);
                true
            }
            HeaderKind::Content => match self.content.as_mut() {
                Some(content) => {
                    content.headers.append(name.clone(), value);
                    true
                }
                None => false,
            },
            HeaderKind::Response => false,
        }
    }

    /// Flatten into an `http::Request` for a client. Content headers follow
    /// the request headers.
    pub fn into_http(self) -> Request<Body> {
        let mut headers = self.headers;
        let body = match self.content {
            Some(content) => {
                for (name, value) in content.headers.iter() {
                    headers.append(name.clone(), value.clone());
                }
                content.body
            }
            None => Body::empty(),
        };

        let mut request = Request::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = headers;
        request
    }
}

/// Whether `method` carries a body upstream. Comparison is ASCII
/// case-insensitive: `get` is as bodyless as `GET`.
pub fn method_allows_body(method: &Method) -> bool {
    !BODYLESS_METHODS
        .iter()
        .any(|m| method.as_str().eq_ignore_ascii_case(m))
}

/// Build the outbound request for `target` from the inbound exchange.
pub fn build_outbound_request(
    ctx: &mut InboundContext,
    target: &str,
    add_forwarded_headers: bool,
) -> Result<OutboundRequest, ProxyError> {
    let (uri, authority) = parse_target(target)?;

    let content = if method_allows_body(ctx.method()) {
        Some(OutboundContent {
            headers: HeaderMap::new(),
            body: ctx.take_body(),
        })
    } else {
        None
    };

    let mut request = OutboundRequest {
        method: ctx.method().clone(),
        uri: uri.clone(),
        headers: HeaderMap::with_capacity(ctx.headers().len()),
        content,
    };

    let mut dropped = 0usize;
    for (name, value) in ctx.headers() {
        if !request.place_header(name, value.clone()) {
            dropped += 1;
        }
    }

    if add_forwarded_headers {
        ForwardedHeaders::from_context(ctx).apply(&mut request.headers);
    }

    request.headers.insert(header::HOST, authority);
    request.uri = uri;
    request.method = ctx.method().clone();

    tracing::trace!(
        method = %request.method,
        uri = %request.uri,
        headers = request.headers.len(),
        dropped,
        has_body = request.content.is_some(),
        "Outbound request built"
    );

    Ok(request)
}

/// Parse an absolute http(s) target and compute its `Host` value. Default
/// ports are omitted from the authority.
fn parse_target(target: &str) -> Result<(Uri, HeaderValue), ProxyError> {
    let url = Url::parse(target).map_err(|e| ProxyError::InvalidTarget(format!("{target}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidTarget(format!(
            "{target}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ProxyError::InvalidTarget(format!("{target}: missing host")))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|e| ProxyError::InvalidTarget(format!("{target}: {e}")))?;
    let authority = HeaderValue::from_str(&authority)
        .map_err(|e| ProxyError::InvalidTarget(format!("{target}: {e}")))?;

    Ok((uri, authority))
}
