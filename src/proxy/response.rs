//! Upstream response relay.
//!
//! # Responsibilities
//! - Copy the upstream status verbatim (no remapping)
//! - Copy response headers, then content headers; each name replaces what
//!   the sink already holds for it
//! - Strip `Transfer-Encoding`; the sink owns its framing
//! - Stream the body into the sink chunk by chunk

use std::io;

use axum::body::Body;
use axum::http::header::{self, HeaderMap};
use axum::http::{Response, StatusCode};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::proxy::error::{ExchangePhase, ProxyError};
use crate::proxy::headers::split_content_headers;
use crate::proxy::sink::ResponseSink;

/// Response received from upstream, head available and body still streaming.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_headers: HeaderMap,
    pub body: Body,
}

impl UpstreamResponse {
    /// Split a client response into response and content headers.
    pub fn from_http(response: Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        let (headers, content_headers) = split_content_headers(parts.headers);
        Self {
            status: parts.status,
            headers,
            content_headers,
            body,
        }
    }
}

/// Relay `upstream` into `sink`. Completes once the whole body has been
/// written and the sink completed.
pub async fn relay_response(
    upstream: UpstreamResponse,
    sink: &mut dyn ResponseSink,
    cancellation: &CancellationToken,
) -> Result<(), ProxyError> {
    sink.set_status(upstream.status);

    let target = sink.headers_mut();
    replace_each(target, &upstream.headers);
    replace_each(target, &upstream.content_headers);
    target.remove(header::TRANSFER_ENCODING);

    let mut stream = upstream.body.into_data_stream();
    let mut copied = 0usize;
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(ProxyError::UpstreamTimeout { phase: ExchangePhase::BodyCopy });
            }
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = chunk else {
            break;
        };
        let chunk = chunk.map_err(|e| ProxyError::BodyStreamFailure(io::Error::other(e)))?;
        copied += chunk.len();
        // Also ends a write stalled on backpressure.
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(ProxyError::UpstreamTimeout { phase: ExchangePhase::BodyCopy });
            }
            written = sink.write(chunk) => written.map_err(ProxyError::BodyStreamFailure)?,
        }
    }

    sink.complete().await.map_err(ProxyError::BodyStreamFailure)?;

    tracing::trace!(status = %upstream.status, bytes = copied, "Upstream body relayed");
    Ok(())
}

/// Overwrite every name in `source` on `target`, keeping all of its values.
fn replace_each(target: &mut HeaderMap, source: &HeaderMap) {
    for name in source.keys() {
        target.remove(name);
        for value in source.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}
