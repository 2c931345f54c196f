//! Forwarding orchestration.
//!
//! # Pipeline
//! ```text
//! intercept? ──true──▶ complete sink, done (no upstream contact)
//!     │false
//!     ▼
//! build outbound → before_send → dispatch (headers only) → after_receive → relay
//! ```
//!
//! Every step runs to completion before the next one starts. Dispatch and the
//! body copy race the inbound cancellation token.

use tokio_util::sync::CancellationToken;

use crate::client::{ClientRegistry, CompletionMode, HttpClient};
use crate::proxy::context::InboundContext;
use crate::proxy::error::{ExchangePhase, ProxyError};
use crate::proxy::options::ProxyOptions;
use crate::proxy::request::{build_outbound_request, OutboundRequest};
use crate::proxy::response::{relay_response, UpstreamResponse};

/// Forwards inbound requests through the client profiles of a registry.
#[derive(Debug, Clone)]
pub struct Forwarder {
    clients: ClientRegistry,
}

impl Forwarder {
    pub fn new(clients: ClientRegistry) -> Self {
        Self { clients }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Forward the inbound request to `target` and relay the answer into the
    /// context's response sink.
    pub async fn forward(
        &self,
        ctx: &mut InboundContext,
        target: &str,
        options: &ProxyOptions,
    ) -> Result<(), ProxyError> {
        if let Some(intercept) = &options.intercept {
            if intercept(ctx).await {
                tracing::debug!(method = %ctx.method(), uri = %ctx.uri(), "Request intercepted");
                ctx.response_mut()
                    .complete()
                    .await
                    .map_err(ProxyError::BodyStreamFailure)?;
                return Ok(());
            }
        }

        let mut outbound = build_outbound_request(ctx, target, options.add_forwarded_headers)?;

        if let Some(before_send) = &options.before_send {
            before_send(ctx, &mut outbound).await;
        }

        let client = self
            .clients
            .get(&options.client_name)
            .ok_or_else(|| ProxyError::UnknownClient(options.client_name.clone()))?;

        tracing::debug!(
            method = %outbound.method(),
            target = %outbound.uri(),
            client = %options.client_name,
            "Dispatching upstream request"
        );

        let cancellation = ctx.cancellation().clone();
        let mut upstream = dispatch(client.as_ref(), outbound, &cancellation).await?;

        tracing::debug!(status = %upstream.status, "Upstream response head received");

        if let Some(after_receive) = &options.after_receive {
            after_receive(ctx, &mut upstream).await;
        }

        relay_response(upstream, ctx.response_mut(), &cancellation).await
    }
}

async fn dispatch(
    client: &dyn HttpClient,
    outbound: OutboundRequest,
    cancellation: &CancellationToken,
) -> Result<UpstreamResponse, ProxyError> {
    let send = client.send(outbound.into_http(), CompletionMode::ResponseHeadersRead);

    // Losing the race drops `send`, which aborts the upstream call.
    let response = tokio::select! {
        biased;
        _ = cancellation.cancelled() => {
            tracing::debug!("Inbound request cancelled during dispatch");
            return Err(ProxyError::UpstreamTimeout { phase: ExchangePhase::Dispatch });
        }
        response = send => response.map_err(|e| {
            tracing::warn!(error = %e, "Upstream dispatch failed");
            ProxyError::from(e)
        })?,
    };

    Ok(UpstreamResponse::from_http(response))
}
